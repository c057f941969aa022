//! HTTP errors carrying a public message and a private cause, and panic
//! recovery for handlers.

use std::any::Any;
use std::fmt;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;

use crate::base::{install_backtrace_hook, panic_message, take_backtrace};
use crate::lifecycle::BoxError;

const INTERNAL_ERROR: &str = "500 Internal Server Error";

/// An error with a status and a message fit for clients.
///
/// `Display` renders the underlying cause, which is only ever logged.
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub user_message: String,
    pub source: BoxError,
}

impl HttpError {
    pub fn new(status: StatusCode, user_message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            status,
            user_message: user_message.into(),
            source: source.into(),
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        tracing::error!(status = %self.status, error = %self.source, "Request failed");
        plain_text(self.status, self.user_message)
    }
}

/// What to tell the client and what to log about a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetails {
    pub status: StatusCode,
    pub user_message: String,
    pub log_error: String,
}

/// Derive response details from a panic payload.
///
/// [`HttpError`] payloads keep their status and message; anything else is a
/// generic 500.
pub fn error_details(payload: &(dyn Any + Send)) -> ErrorDetails {
    match payload.downcast_ref::<HttpError>() {
        Some(err) => ErrorDetails {
            status: err.status,
            user_message: err.user_message.clone(),
            log_error: err.to_string(),
        },
        None => ErrorDetails {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            user_message: INTERNAL_ERROR.to_string(),
            log_error: panic_message(payload),
        },
    }
}

pub type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

/// Turn handler panics into plain-text error responses.
///
/// Installs the backtrace hook so the log carries where the panic happened.
pub fn catch_panic_layer() -> CatchPanicLayer<PanicHandler> {
    install_backtrace_hook();
    CatchPanicLayer::custom(plain_panic_response as PanicHandler)
}

/// Turn handler panics into `{"success":false,"message":..}` responses.
pub fn json_panic_layer() -> CatchPanicLayer<PanicHandler> {
    install_backtrace_hook();
    CatchPanicLayer::custom(json_panic_response as PanicHandler)
}

fn log_panic(details: &ErrorDetails) {
    // The handler runs on the thread that panicked, right after the unwind.
    let backtrace = take_backtrace();
    tracing::error!(
        status = %details.status,
        error = %details.log_error,
        backtrace = backtrace.as_ref().map(tracing::field::display),
        "Handler panicked"
    );
}

fn plain_panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let details = error_details(&*payload);
    log_panic(&details);
    plain_text(details.status, details.user_message)
}

#[derive(Serialize)]
struct PanicBody<'a> {
    success: bool,
    message: &'a str,
}

fn json_panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let details = error_details(&*payload);
    log_panic(&details);
    let body = PanicBody {
        success: false,
        message: &details.user_message,
    };
    super::json::JsonReply::with_status(details.status, body).into_response()
}

fn plain_text(status: StatusCode, message: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("{message}\n"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn panicking_router() -> Router {
        Router::new()
            .route("/plain", get(|| async {
                panic!("db handle poisoned");
                #[allow(unreachable_code)]
                ()
            }))
            .route(
                "/typed",
                get(|| async {
                    std::panic::panic_any(HttpError::new(StatusCode::FORBIDDEN, "Nope", "user 4 lacks role"));
                    #[allow(unreachable_code)]
                    ()
                }),
            )
    }

    async fn body_string(rsp: Response) -> String {
        String::from_utf8(to_bytes(rsp.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap()
    }

    #[test]
    fn details_for_http_error_and_other_payloads() {
        let err = HttpError::new(StatusCode::NOT_FOUND, "Missing", "no row 3");
        let details = error_details(&err);
        assert_eq!(details.status, StatusCode::NOT_FOUND);
        assert_eq!(details.user_message, "Missing");
        assert_eq!(details.log_error, "no row 3");

        let details = error_details(&"boom");
        assert_eq!(details.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(details.user_message, INTERNAL_ERROR);
        assert_eq!(details.log_error, "boom");
    }

    #[tokio::test]
    async fn plain_layer_hides_panic_message() {
        let app = panicking_router().layer(catch_panic_layer());
        let rsp = app
            .oneshot(Request::get("/plain").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(rsp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(rsp).await, "500 Internal Server Error\n");
    }

    #[tokio::test]
    async fn json_layer_uses_http_error_status() {
        let app = panicking_router().layer(json_panic_layer());
        let rsp = app
            .oneshot(Request::get("/typed").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(rsp.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            rsp.headers()[header::CONTENT_TYPE],
            "application/json; charset=utf-8"
        );
        assert_eq!(body_string(rsp).await, r#"{"success":false,"message":"Nope"}"#);
    }
}
