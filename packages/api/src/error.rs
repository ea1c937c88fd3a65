// ABOUTME: API error type and its HTTP mapping
// ABOUTME: Turns workflow errors into status codes with machine-readable codes

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bookshare_storage::StorageError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Error returned by every handler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Error body: `{"success": false, "code": ..., "message": ...}`
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn to_status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Storage(err) => match err {
                StorageError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                StorageError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                StorageError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                StorageError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                StorageError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                StorageError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
                StorageError::LimitExceeded(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "LIMIT_EXCEEDED")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
        }
    }

    /// Message shown to the caller; infrastructure details stay in the logs
    fn to_user_message(&self) -> String {
        match self {
            ApiError::Storage(err) if !err.is_domain() => {
                "An internal server error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.to_status_and_code();

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = ErrorResponse {
            success: false,
            code,
            message: self.to_user_message(),
        };

        (status, Json(body)).into_response()
    }
}
