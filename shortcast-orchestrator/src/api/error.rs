//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::engine::RunError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    /// Precondition failure: gate/result fetched or resumed out of state,
    /// or a concurrent executor holds the run.
    Conflict(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<RunError> for ApiError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::NotFound(id) => ApiError::NotFound(format!("Run {} not found", id)),
            RunError::Validation(msg) => ApiError::BadRequest(msg),
            RunError::OrderingViolation(msg) => ApiError::Conflict(msg),
            RunError::RunBusy(id) => {
                ApiError::Conflict(format!("Run {} has an operation in flight", id))
            }
            RunError::NotCompleted(id) => {
                ApiError::Conflict(format!("Run {} has not completed", id))
            }
            RunError::Internal(msg) => ApiError::InternalError(msg),
            RunError::Store(err) => ApiError::InternalError(format!("store error: {}", err)),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
