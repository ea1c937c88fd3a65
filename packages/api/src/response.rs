// ABOUTME: Shared API response type
// ABOUTME: Success bodies are `{"success": true, <key>: <payload>, ...}`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bookshare_storage::StorageError;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Success response built from named payloads
pub struct ApiResponse {
    status: StatusCode,
    body: Result<Map<String, Value>, serde_json::Error>,
}

impl ApiResponse {
    pub fn ok() -> Self {
        Self::with_status(StatusCode::OK)
    }

    pub fn created() -> Self {
        Self::with_status(StatusCode::CREATED)
    }

    fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            body: Ok(Map::new()),
        }
    }

    /// Add a named payload to the body
    pub fn with<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.body = match (self.body, serde_json::to_value(value)) {
            (Ok(mut body), Ok(value)) => {
                body.insert(key.to_string(), value);
                Ok(body)
            }
            (Ok(_), Err(e)) | (Err(e), _) => Err(e),
        };
        self
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::ok().with("message", message.into())
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        match self.body {
            Ok(mut body) => {
                body.insert("success".to_string(), Value::Bool(true));
                (self.status, Json(Value::Object(body))).into_response()
            }
            Err(e) => ApiError::from(StorageError::Json(e)).into_response(),
        }
    }
}

pub type ApiResult = Result<ApiResponse, ApiError>;
