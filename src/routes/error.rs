// `{code, msg, data}` response envelope and the handler error type.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::models::{DiskUsageDecodeError, ValidationError};

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub code: u16,
    pub msg: String,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        Self {
            code: status.as_u16(),
            msg: status.canonical_reason().unwrap_or("").to_string(),
            data,
        }
    }
}

/// 200 envelope around `data`.
pub(crate) fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(Envelope::new(StatusCode::OK, data))).into_response()
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage: {0:#}")]
    Storage(#[from] anyhow::Error),
    #[error("reshape: {0}")]
    Reshape(#[from] DiskUsageDecodeError),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Reshape(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        // Server-side detail stays in the log; clients get the reason phrase only.
        let data = if status.is_server_error() {
            serde_json::Value::Null
        } else {
            serde_json::Value::String(self.to_string())
        };
        (status, Json(Envelope::new(status, data))).into_response()
    }
}
