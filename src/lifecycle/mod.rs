//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Serve (supervisor.rs):
//!     ListenSpec → Bind listener → Spawn run task → Wait
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/SIGQUIT → Termination event
//!
//! Shutdown (shutdown.rs):
//!     Termination event → Broadcast shutdown → Drain for grace period → Abort
//! ```
//!
//! # Design Decisions
//! - The run task owns the listener; the supervisor only owns the socket file
//! - A signal is a normal termination and is reported, not treated as an error
//! - Run task panics surface as errors instead of unwinding into the caller

pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use shutdown::{Shutdown, ShutdownListener};
pub use signals::{OsSignals, TerminationSignal};
pub use supervisor::{daemonize, daemonize_until, BoxError, ServeError, Supervisor, TerminationEvent};
