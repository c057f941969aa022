//! `groundwork` binary: serve a directory tree under the supervisor.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use groundwork::config::{load_config, validate_config, AppConfig};
use groundwork::http::FileServer;
use groundwork::lifecycle::Supervisor;
use groundwork::observability::logging;

#[derive(Parser)]
#[command(name = "groundwork")]
#[command(about = "Serve a directory over HTTP with graceful, signal-driven shutdown", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen URI, overriding the config file (e.g. tcp://0.0.0.0:8080, unix:///tmp/app.sock).
    #[arg(short, long)]
    listen: Option<String>,

    /// Directory to serve, overriding the config file.
    #[arg(short, long)]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("groundwork: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("groundwork: failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Exiting with error");
            ExitCode::FAILURE
        }
    }
}

fn build_config(cli: &Cli) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(listen) = &cli.listen {
        config.server.listen = listen.clone();
    }
    if let Some(root) = &cli.root {
        config.server.root = root.clone();
    }
    validate_config(&config).map_err(|errors| {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    })?;
    Ok(config)
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen,
        root = %config.server.root.display(),
        request_timeout_secs = config.server.request_timeout_secs,
        "groundwork starting"
    );

    let server = FileServer::new(&config.server)?;
    let supervisor = Supervisor::new(config.server.listen_spec()?).grace_period(config.server.shutdown_grace());

    let event = supervisor
        .serve(move |listener, shutdown| server.run(listener, shutdown))
        .await?;

    tracing::info!(%event, "Shutdown complete");
    Ok(())
}
