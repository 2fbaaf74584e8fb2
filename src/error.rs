//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::queue::PublishError;
use crate::sanitize::SanitizeError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Auth errors
    Unauthorized,

    // Validation errors
    ValidationError(String),

    // Queue errors
    PublishFailed(String),

    // Placeholder routes
    NotAvailable,

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "unauthorized" }),
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg }),
            ),
            AppError::PublishFailed(msg) => {
                tracing::error!("Queue publish error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "publish_failed" }),
                )
            }
            AppError::NotAvailable => (
                StatusCode::NOT_IMPLEMENTED,
                json!({
                    "error": "not_available",
                    "hint": "Query BigQuery table fed by Pub/Sub subscription."
                }),
            ),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal_error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<PublishError> for AppError {
    fn from(err: PublishError) -> Self {
        AppError::PublishFailed(err.to_string())
    }
}

impl From<SanitizeError> for AppError {
    fn from(err: SanitizeError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(_: serde_json::Error) -> Self {
        AppError::ValidationError("Body must be valid JSON".to_string())
    }
}
