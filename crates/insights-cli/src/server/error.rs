//! API error types and handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use insights::InsightError;
use serde::Serialize;

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from client.
    BadRequest(String),
    /// Error from the insights library.
    Insight(InsightError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    status_code: u16,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Insight(e) => match e {
                InsightError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                InsightError::InvalidState { .. } => (StatusCode::CONFLICT, "invalid_state"),
                InsightError::NotReady { .. } => (StatusCode::CONFLICT, "not_ready"),
                InsightError::Parse { .. } => (StatusCode::BAD_REQUEST, "parse_error"),
                InsightError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.parts();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message: self.to_string(),
                status_code: status.as_u16(),
            }),
        )
            .into_response()
    }
}

impl From<InsightError> for ApiError {
    fn from(err: InsightError) -> Self {
        ApiError::Insight(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Insight(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ApiError {}
