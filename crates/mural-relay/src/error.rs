//! Error types for the relay's HTTP layer.
//!
//! [`RelayError`] covers the few failures an HTTP handler can observe and
//! converts into a JSON error response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Protocol
//! and storage failures never reach this type: they are logged and dropped
//! (or reported as `imageSaved`) where they occur.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the relay's HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The dispatcher task is gone; no event can be delivered.
    #[error("relay dispatcher is not running")]
    DispatcherClosed,

    /// The dispatcher dropped a reply channel without answering.
    #[error("relay dispatcher did not reply: {0}")]
    NoReply(#[from] tokio::sync::oneshot::error::RecvError),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::DispatcherClosed | Self::NoReply(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            Self::Serialization(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("JSON error: {e}"))
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
