//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! supervised Listener (tcp / unix)
//!     → server.rs (Axum setup, middleware)
//!     → dispatch (route table → index / health / files / hexdump)
//!     → JSON, file bytes or text response
//! ```

pub mod server;

pub use server::{FileServer, ServerError};
