//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! "tcp://host:port" | "unix:///path"
//!     → spec.rs (parse into ListenSpec / DialSpec)
//!     → listener.rs (bind, accept, socket file guard)
//!     → stream.rs (transport-agnostic connection)
//!     → Hand off to the server loop (axum::serve or custom)
//! ```
//!
//! # Design Decisions
//! - Transport is chosen by URI scheme, validated at parse time
//! - Unix listeners own their socket file through a drop guard

pub mod listener;
pub mod spec;
pub mod stream;

pub use listener::{Listener, ListenerError, SocketAddress, SocketFile};
pub use spec::{DialSpec, ListenSpec, ParseError, Transport};
pub use stream::Stream;
