use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::notion::NotionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Remote record error: {0}")]
    Notion(#[from] NotionError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Notion(NotionError::NotConfigured) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "NOTION_NOT_CONFIGURED",
                "Remote record service is not configured".to_string(),
            ),
            AppError::Notion(NotionError::Api { status: 404, message }) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", message.clone())
            }
            AppError::Notion(e) => {
                tracing::error!("Remote record error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "NOTION_ERROR",
                    "The remote record service request failed".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
