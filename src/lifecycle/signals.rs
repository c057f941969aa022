//! OS signal handling.
//!
//! # Responsibilities
//! - Register interest in SIGINT, SIGTERM and SIGQUIT
//! - Translate the first delivery into a [`TerminationSignal`]
//!
//! # Design Decisions
//! - Registration is synchronous so no signal is missed between registering
//!   and waiting
//! - Dropping [`OsSignals`] drops the tokio streams, ending this interest
//! - Outside unix only Ctrl-C is observed

use std::fmt;
use std::io;

/// An OS request to terminate the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationSignal {
    /// SIGINT, or Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// SIGQUIT.
    Quit,
}

impl TerminationSignal {
    pub fn name(&self) -> &'static str {
        match self {
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Terminate => "SIGTERM",
            TerminationSignal::Quit => "SIGQUIT",
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Registered interest in process termination signals.
#[derive(Debug)]
pub struct OsSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    quit: tokio::signal::unix::Signal,
}

impl OsSignals {
    /// Register handlers. Must be called from within a tokio runtime.
    #[cfg(unix)]
    pub fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    #[cfg(not(unix))]
    pub fn register() -> io::Result<Self> {
        Ok(Self {})
    }

    /// Wait for the next termination signal.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> TerminationSignal {
        let received = tokio::select! {
            Some(()) = self.interrupt.recv() => TerminationSignal::Interrupt,
            Some(()) = self.terminate.recv() => TerminationSignal::Terminate,
            Some(()) = self.quit.recv() => TerminationSignal::Quit,
            else => return std::future::pending().await,
        };
        tracing::info!(signal = %received, "Termination signal received");
        received
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> TerminationSignal {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            return std::future::pending().await;
        }
        tracing::info!(signal = %TerminationSignal::Interrupt, "Termination signal received");
        TerminationSignal::Interrupt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_names() {
        assert_eq!(TerminationSignal::Interrupt.to_string(), "SIGINT");
        assert_eq!(TerminationSignal::Terminate.to_string(), "SIGTERM");
        assert_eq!(TerminationSignal::Quit.to_string(), "SIGQUIT");
    }

    #[tokio::test]
    async fn registers_inside_runtime() {
        let signals = OsSignals::register();
        assert!(signals.is_ok());
    }
}
