//! JSON responses.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const SERIALIZE_FAILED: &str =
    r#"{"success":false,"message":"There was an error attempting to marshal the response object to JSON."}"#;

/// A serialisable value answered as JSON.
#[derive(Debug, Clone)]
pub struct JsonReply<T> {
    status: StatusCode,
    value: T,
}

impl<T: Serialize> JsonReply<T> {
    pub fn new(value: T) -> Self {
        Self::with_status(StatusCode::OK, value)
    }

    pub fn with_status(status: StatusCode, value: T) -> Self {
        Self { status, value }
    }
}

impl<T: Serialize> IntoResponse for JsonReply<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.value) {
            Ok(bytes) => json_bytes(self.status, bytes),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize JSON response");
                json_bytes(StatusCode::INTERNAL_SERVER_ERROR, SERIALIZE_FAILED.as_bytes().to_vec())
            }
        }
    }
}

fn json_bytes(status: StatusCode, bytes: Vec<u8>) -> Response {
    let mut rsp = (status, bytes).into_response();
    rsp.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    rsp
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Success<T> {
    pub status_code: u16,
    pub result: T,
}

/// `200 OK` with `{"statusCode":200,"result":..}`.
pub fn json_success<T: Serialize>(result: T) -> JsonReply<Success<T>> {
    JsonReply::new(Success {
        status_code: StatusCode::OK.as_u16(),
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde::ser::Error as _;
    use serde_json::json;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("cycle detected"))
        }
    }

    async fn parts(rsp: Response) -> (StatusCode, String, String) {
        let status = rsp.status();
        let ctype = rsp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        let body = to_bytes(rsp.into_body(), usize::MAX).await.unwrap();
        (status, ctype, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn success_envelope() {
        let (status, ctype, body) = parts(json_success(json!({"ok": true})).into_response()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ctype, JSON_CONTENT_TYPE);
        assert_eq!(body, r#"{"statusCode":200,"result":{"ok":true}}"#);
    }

    #[tokio::test]
    async fn serialization_failure_is_canned_500() {
        let (status, ctype, body) = parts(JsonReply::new(Unserializable).into_response()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ctype, JSON_CONTENT_TYPE);
        assert_eq!(body, SERIALIZE_FAILED);
    }
}
