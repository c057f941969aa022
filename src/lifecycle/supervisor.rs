//! One-shot server supervisor.
//!
//! # Data Flow
//! ```text
//! ListenSpec
//!     → prepare socket directory (unix, best effort)
//!     → bind Listener                      ── fail → ServeError::Listen
//!     → register termination signals       ── fail → ServeError::Signals
//!     → spawn task: run(listener handle, shutdown)
//!     → wait: first of { signal, run completes }
//!         signal    → trigger shutdown → drain up to grace period → abort
//!         completed → run's own result
//!     → close listener
//!     → remove unix socket file
//! ```
//!
//! # Design Decisions
//! - `run` gets a handle to the listener, but the supervisor keeps its own and
//!   closes the socket before returning, even if `run` passed its handle on
//! - `run` itself is called inside the spawned task, so a panic while it
//!   builds its future is reported like any other panic
//! - Socket file removal is a drop guard, so it happens exactly once on every
//!   path out, unwinding included
//! - A signal-triggered shutdown is a success; the signal is reported in the
//!   returned [`TerminationEvent`]

use std::fmt;
use std::future::Future;
use std::io;
use std::path::Path;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};

use super::shutdown::{Shutdown, ShutdownListener};
use super::signals::{OsSignals, TerminationSignal};
use crate::base::panic::panic_message;
use crate::net::{ListenSpec, Listener, ListenerError, SocketFile};

/// Boxed error returned by server loops.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by [`Supervisor::serve`] and [`daemonize`].
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The listener could not be opened. Nothing was acquired.
    #[error(transparent)]
    Listen(#[from] ListenerError),
    /// Signal handlers could not be installed.
    #[error("failed to register signal handlers: {0}")]
    Signals(#[source] io::Error),
    /// The server loop returned an error on its own.
    #[error("server loop failed: {0}")]
    Run(#[source] BoxError),
    /// The server loop panicked.
    #[error("server loop panicked: {0}")]
    Panicked(String),
}

/// Why a supervised run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationEvent {
    /// The OS asked the process to stop.
    Signal(TerminationSignal),
    /// The server loop returned by itself.
    Completed,
}

impl TerminationEvent {
    /// The signal that ended the run, if any.
    pub fn signal(&self) -> Option<TerminationSignal> {
        match self {
            TerminationEvent::Signal(signal) => Some(*signal),
            TerminationEvent::Completed => None,
        }
    }
}

impl fmt::Display for TerminationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationEvent::Signal(signal) => write!(f, "Received {}.", signal),
            TerminationEvent::Completed => f.write_str("Normal program termination."),
        }
    }
}

/// Runs one server loop on one listener until a signal or completion.
#[derive(Debug, Clone)]
pub struct Supervisor {
    spec: ListenSpec,
    grace_period: Duration,
}

impl Supervisor {
    /// How long a signalled server loop may take to stop before it is aborted.
    pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

    pub fn new(spec: ListenSpec) -> Self {
        Self {
            spec,
            grace_period: Self::DEFAULT_GRACE_PERIOD,
        }
    }

    /// Set the drain window after a signal. Zero aborts the loop immediately.
    pub fn grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn spec(&self) -> &ListenSpec {
        &self.spec
    }

    /// Serve until SIGINT, SIGTERM or SIGQUIT arrives or `run` returns.
    pub async fn serve<F, Fut, E>(&self, run: F) -> Result<TerminationEvent, ServeError>
    where
        F: FnOnce(Listener, ShutdownListener) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let (listener, socket_file) = self.open().await?;
        let mut signals = OsSignals::register().map_err(ServeError::Signals)?;
        self.supervise(listener, socket_file, run, async move { signals.recv().await })
            .await
    }

    /// Like [`serve`](Self::serve), but the termination request comes from
    /// `termination` instead of the OS.
    pub async fn serve_until<F, Fut, E, T>(&self, run: F, termination: T) -> Result<TerminationEvent, ServeError>
    where
        F: FnOnce(Listener, ShutdownListener) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError> + 'static,
        T: Future<Output = TerminationSignal>,
    {
        let (listener, socket_file) = self.open().await?;
        self.supervise(listener, socket_file, run, termination).await
    }

    async fn open(&self) -> Result<(Listener, SocketFile), ServeError> {
        if self.spec.transport().is_unix() {
            prepare_socket_dir(Path::new(self.spec.address()));
        }
        let listener = Listener::bind(&self.spec).await?;
        Ok((listener, SocketFile::for_spec(&self.spec)))
    }

    async fn supervise<F, Fut, E, T>(
        &self,
        listener: Listener,
        socket_file: SocketFile,
        run: F,
        termination: T,
    ) -> Result<TerminationEvent, ServeError>
    where
        F: FnOnce(Listener, ShutdownListener) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError> + 'static,
        T: Future<Output = TerminationSignal>,
    {
        tracing::info!(endpoint = %self.spec, "Serving");

        let shutdown = Shutdown::new();
        let owned = listener.handle();
        let subscriber = shutdown.subscribe();
        let task = spawn_run(move || run(listener, subscriber));
        let result = wait_for_termination(task, &shutdown, termination, self.grace_period).await;

        owned.close();
        drop(socket_file);

        match &result {
            Ok(event) => tracing::info!(endpoint = %self.spec, %event, "Stopped serving"),
            Err(e) => tracing::error!(endpoint = %self.spec, error = %e, "Stopped serving"),
        }
        result
    }
}

/// Supervise a listener-less background loop against OS termination signals.
pub async fn daemonize<F, Fut, E>(run: F) -> Result<TerminationEvent, ServeError>
where
    F: FnOnce(ShutdownListener) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<BoxError> + 'static,
{
    let mut signals = OsSignals::register().map_err(ServeError::Signals)?;
    daemonize_until(run, async move { signals.recv().await }).await
}

/// Like [`daemonize`], with a caller-supplied termination source.
pub async fn daemonize_until<F, Fut, E, T>(run: F, termination: T) -> Result<TerminationEvent, ServeError>
where
    F: FnOnce(ShutdownListener) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<BoxError> + 'static,
    T: Future<Output = TerminationSignal>,
{
    let shutdown = Shutdown::new();
    let subscriber = shutdown.subscribe();
    let task = spawn_run(move || run(subscriber));
    wait_for_termination(task, &shutdown, termination, Supervisor::DEFAULT_GRACE_PERIOD).await
}

fn spawn_run<S, Fut, E>(start: S) -> JoinHandle<Result<(), BoxError>>
where
    S: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<BoxError> + 'static,
{
    tokio::spawn(async move { start().await.map_err(Into::into) })
}

async fn wait_for_termination<T>(
    mut task: JoinHandle<Result<(), BoxError>>,
    shutdown: &Shutdown,
    termination: T,
    grace_period: Duration,
) -> Result<TerminationEvent, ServeError>
where
    T: Future<Output = TerminationSignal>,
{
    // The termination future (and any signal registration inside it) is
    // dropped at the end of this block.
    let signal = {
        tokio::pin!(termination);
        tokio::select! {
            signal = &mut termination => signal,
            joined = &mut task => {
                return joined_result(joined).map(|()| TerminationEvent::Completed);
            }
        }
    };

    tracing::info!(%signal, listeners = shutdown.receiver_count(), "Termination requested, draining");
    shutdown.trigger();
    drain(task, grace_period).await;
    Ok(TerminationEvent::Signal(signal))
}

async fn drain(mut task: JoinHandle<Result<(), BoxError>>, grace_period: Duration) {
    match tokio::time::timeout(grace_period, &mut task).await {
        Ok(joined) => match joined_result(joined) {
            Ok(()) => tracing::debug!("Server loop drained"),
            Err(e) => tracing::warn!(error = %e, "Server loop failed while draining"),
        },
        Err(_) => {
            tracing::warn!(
                grace_period_ms = grace_period.as_millis() as u64,
                "Server loop still running after grace period, aborting"
            );
            task.abort();
            // Resolves once the task's future has been dropped.
            let _ = task.await;
        }
    }
}

fn joined_result(joined: Result<Result<(), BoxError>, JoinError>) -> Result<(), ServeError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ServeError::Run(e)),
        Err(e) if e.is_panic() => Err(ServeError::Panicked(panic_message(&*e.into_panic()))),
        Err(e) => Err(ServeError::Run(Box::new(e))),
    }
}

fn prepare_socket_dir(socket_path: &Path) {
    let Some(dir) = socket_path.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return;
    };

    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o770);
    }

    // The bind that follows reports anything that matters.
    if let Err(e) = builder.create(dir) {
        tracing::debug!(dir = %dir.display(), error = %e, "Could not create socket directory");
    }
}
