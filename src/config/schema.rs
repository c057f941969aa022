//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::net::{ListenSpec, ParseError};

/// Root configuration for the file server.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Listener and request handling settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen URI, e.g. `tcp://127.0.0.1:8080` or `unix:///run/app.sock`.
    pub listen: String,

    /// Directory served under `/files` and `/hexdump`.
    pub root: PathBuf,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// How long in-flight requests may drain after a termination signal.
    pub shutdown_grace_secs: u64,

    /// Bytes shown by `/hexdump`.
    pub hexdump_limit: usize,

    /// Optional HTML templates.
    pub templates: Option<TemplatesConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "tcp://127.0.0.1:8080".to_string(),
            root: PathBuf::from("."),
            request_timeout_secs: 30,
            shutdown_grace_secs: 5,
            hexdump_limit: 4096,
            templates: None,
        }
    }
}

impl ServerConfig {
    pub fn listen_spec(&self) -> Result<ListenSpec, ParseError> {
        self.listen.parse()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// Template directory and file pattern.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TemplatesConfig {
    pub dir: PathBuf,

    #[serde(default = "default_template_pattern")]
    pub pattern: String,
}

fn default_template_pattern() -> String {
    "*.html".to_string()
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}
