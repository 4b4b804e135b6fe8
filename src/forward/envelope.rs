//! The JSON error body sent when forwarding fails before commit.

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};

use super::ResponseSink;

pub const ERROR_TYPE: &str = "request_error";
pub const ERROR_CODE: &str = "FORWARD_ERR";

/// `{"error":{"message":…,"type":"request_error","code":"FORWARD_ERR"}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
}

impl ErrorEnvelope {
    #[must_use]
    pub fn forward_error(message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                kind: ERROR_TYPE.to_string(),
                code: ERROR_CODE.to_string(),
            },
        }
    }
}

/// Commit `status` with a JSON [`ErrorEnvelope`] carrying `message`.
///
/// Only meaningful while the sink is uncommitted; afterwards the status
/// write is ignored by the sink.
pub async fn respond_with_error<S>(
    sink: &mut S,
    status: StatusCode,
    message: &str,
) -> std::io::Result<()>
where
    S: ResponseSink + ?Sized,
{
    let body = serde_json::to_vec(&ErrorEnvelope::forward_error(message))?;

    sink.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    sink.write_status(status);
    sink.write(&body).await?;
    if sink.supports_flush() {
        sink.flush().await?;
    }
    Ok(())
}
