use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Failure of a write against the durable store.
///
/// The inner strings carry backend detail for the log; they are never
/// surfaced in an HTTP response body.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store denied the write: {0}")]
    Denied(String),
}

/// Everything that can go wrong while handling one inbound delivery.
/// Each delivery is independent; none of these affect later requests.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("request body is empty")]
    EmptyBody,
    #[error("request body is not a JSON object or array")]
    InvalidPayload,
    #[error("request body exceeds the configured size limit")]
    PayloadTooLarge,
    #[error("webhook signature missing or invalid")]
    InvalidSignature,
    #[error("store write exceeded its time budget")]
    StoreTimeout,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// JSON error body returned to the webhook sender. Carries a stable code
/// and a generic message; backend paths and I/O detail stay in the log.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: &'static str,
}

impl IngestError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::EmptyBody | Self::InvalidPayload => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::StoreTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(StoreError::Denied(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let (code, message) = match self {
            Self::EmptyBody => ("EMPTY_BODY", "request body is required"),
            Self::InvalidPayload => ("INVALID_PAYLOAD", "request body must be a JSON object or array"),
            Self::PayloadTooLarge => ("PAYLOAD_TOO_LARGE", "request body exceeds the size limit"),
            Self::InvalidSignature => ("INVALID_SIGNATURE", "webhook signature missing or invalid"),
            Self::StoreTimeout => ("STORE_TIMEOUT", "storage write timed out"),
            Self::Store(StoreError::Unavailable(_)) => {
                ("STORAGE_UNAVAILABLE", "storage backend unavailable")
            }
            Self::Store(StoreError::Denied(_)) => {
                ("STORAGE_DENIED", "storage backend rejected the write")
            }
        };
        ErrorBody { code, message }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
