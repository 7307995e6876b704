//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Classification failed (only a missing URL can cause this per request).
    #[error("{0}")]
    Classify(#[from] phishguard_core::Error),

    /// The request body could not be parsed.
    #[error("bad request: {0}")]
    BadRequest(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Classify(e) if e.is_client_error() => {
                (StatusCode::BAD_REQUEST, "invalid_input")
            }
            ApiError::Classify(_) => (StatusCode::INTERNAL_SERVER_ERROR, "classifier_error"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
