//! Handler errors that know how to render themselves.
//!
//! A handler returns `Result<_, WebError>`. The error's [`ResponseKind`]
//! picks the body format; [`log_errors`] reports failures after the response
//! is built.

use std::fmt;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::json::JsonReply;
use crate::lifecycle::BoxError;

/// Body format for a [`WebError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseKind {
    /// Not chosen yet; renders no body.
    #[default]
    Undetermined,
    Html,
    Json,
    Empty,
}

#[derive(Debug)]
pub struct WebError {
    pub kind: ResponseKind,
    pub status: StatusCode,
    pub error: BoxError,
}

/// What [`WebError`] leaves behind in the response extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebErrorRecord {
    pub kind: ResponseKind,
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonErrorBody<'a> {
    status_code: u16,
    error: &'a str,
}

impl WebError {
    pub fn new(error: impl Into<BoxError>, status: StatusCode, kind: ResponseKind) -> Self {
        Self {
            kind,
            status,
            error: error.into(),
        }
    }

    pub fn as_json(self) -> Self {
        self.as_kind(ResponseKind::Json)
    }

    pub fn as_html(self) -> Self {
        self.as_kind(ResponseKind::Html)
    }

    pub fn as_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    /// Render according to the kind; `None` while it is undetermined.
    pub fn respond(&self) -> Option<Response> {
        let message = self.error.to_string();
        match self.kind {
            ResponseKind::Undetermined => None,
            ResponseKind::Html => {
                let mut rsp = (self.status, message).into_response();
                rsp.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/html; charset=utf-8"),
                );
                Some(rsp)
            }
            ResponseKind::Json => {
                let body = JsonErrorBody {
                    status_code: self.status.as_u16(),
                    error: &message,
                };
                Some(JsonReply::with_status(self.status, body).into_response())
            }
            ResponseKind::Empty => Some(self.status.into_response()),
        }
    }

    pub fn record(&self) -> WebErrorRecord {
        WebErrorRecord {
            kind: self.kind,
            status: self.status,
            message: self.error.to_string(),
        }
    }
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.error)
    }
}

impl std::error::Error for WebError {}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let mut rsp = self.respond().unwrap_or_else(|| self.status.into_response());
        rsp.extensions_mut().insert(self.record());
        rsp
    }
}

/// Attach a status to a failed `Result`.
pub trait WebResultExt<T> {
    /// Undetermined body format.
    fn or_web_error(self, status: StatusCode) -> Result<T, WebError>;
    fn or_json_error(self, status: StatusCode) -> Result<T, WebError>;
    fn or_html_error(self, status: StatusCode) -> Result<T, WebError>;
}

impl<T, E: Into<BoxError>> WebResultExt<T> for Result<T, E> {
    fn or_web_error(self, status: StatusCode) -> Result<T, WebError> {
        self.map_err(|e| WebError::new(e, status, ResponseKind::Undetermined))
    }

    fn or_json_error(self, status: StatusCode) -> Result<T, WebError> {
        self.map_err(|e| WebError::new(e, status, ResponseKind::Json))
    }

    fn or_html_error(self, status: StatusCode) -> Result<T, WebError> {
        self.map_err(|e| WebError::new(e, status, ResponseKind::Html))
    }
}

pub type ErrorLogFn = dyn Fn(&Method, &Uri, &WebErrorRecord) + Send + Sync;

/// Logger invoked by [`log_errors`].
#[derive(Clone)]
pub struct ErrorLog(Arc<ErrorLogFn>);

impl ErrorLog {
    pub fn new(log: impl Fn(&Method, &Uri, &WebErrorRecord) + Send + Sync + 'static) -> Self {
        Self(Arc::new(log))
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(default_error_log)
    }
}

impl fmt::Debug for ErrorLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorLog")
    }
}

/// Logs `status method uri ERROR message`; statuses below 400 are skipped.
pub fn default_error_log(method: &Method, uri: &Uri, record: &WebErrorRecord) {
    if record.status.as_u16() < 400 {
        return;
    }
    tracing::warn!(
        status = record.status.as_u16(),
        method = %method,
        uri = %uri,
        "{:3} {} {} ERROR {}",
        record.status.as_u16(),
        method,
        uri,
        record.message
    );
}

/// Middleware reporting every [`WebError`] a handler answered with.
///
/// ```ignore
/// router.layer(axum::middleware::from_fn_with_state(ErrorLog::default(), log_errors))
/// ```
pub async fn log_errors(State(log): State<ErrorLog>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let response = next.run(request).await;
    if let Some(record) = response.extensions().get::<WebErrorRecord>() {
        (log.0)(&method, &uri, record);
    }
    response
}
