//! JSON error responses for the HTTP API.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tf_core::error::TfError;

pub const INVALID_ID: &str = "Invalid ID format. ID must be an integer.";

/// API error with status code and message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, code: "not_found", message: msg.into() }
    }
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, code: "bad_request", message: msg.into() }
    }
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::GATEWAY_TIMEOUT, code: "timeout", message: msg.into() }
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, code: "internal_error", message: msg.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.message,
            "code": self.code,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<TfError> for ApiError {
    fn from(err: TfError) -> Self {
        match &err {
            TfError::NotFound { .. } => ApiError::not_found(err.to_string()),
            TfError::Validation(msg) => ApiError::bad_request(msg.clone()),
            TfError::Timeout(_) => ApiError::timeout(err.to_string()),
            _ => {
                tracing::error!(error = %err, "request failed");
                ApiError::internal("internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

/// Parse a path id, rejecting anything that is not an unsigned integer.
pub fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.trim().parse().map_err(|_| ApiError::bad_request(INVALID_ID))
}
