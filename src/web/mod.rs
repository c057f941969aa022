//! Web handler plumbing.
//!
//! # Data Flow
//! ```text
//! Request
//!     → routes.rs (match path, extract remainder)
//!     → handler → Result<_, WebError> / JsonReply
//!     → web_error.rs (render by kind, log_errors middleware)
//!     → error.rs (panic layers turn handler panics into responses)
//! ```

pub mod error;
pub mod json;
pub mod routes;
pub mod templates;
pub mod web_error;

pub use error::{catch_panic_layer, error_details, json_panic_layer, ErrorDetails, HttpError};
pub use json::{json_success, JsonReply, Success, JSON_CONTENT_TYPE};
pub use routes::{
    match_exact_route, match_exact_route_ignore_slash, match_simple_route, match_simple_route_raw, Matcher, Route,
};
pub use templates::{TemplateError, TemplateStore, TemplateWatcher, Templates};
pub use web_error::{default_error_log, log_errors, ErrorLog, ResponseKind, WebError, WebErrorRecord, WebResultExt};
