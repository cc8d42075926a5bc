use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::profile::builder::BuildError;
use crate::sample_source::SampleSourceError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Voice analysis needs at least {min} samples, got {got}")]
    InsufficientSamples { got: usize, min: usize },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Sample source error: {0}")]
    SampleSource(String),

    #[error("Variant generation failed: {0}")]
    Generation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SampleSourceError> for AppError {
    fn from(err: SampleSourceError) -> Self {
        match err {
            SampleSourceError::NotFound(handle) => {
                AppError::NotFound(format!("No account found for handle '{handle}'"))
            }
            SampleSourceError::PrivateOrSuspended(handle) => AppError::UnprocessableEntity(
                format!("Account '{handle}' is private or suspended; its posts cannot be analyzed"),
            ),
            SampleSourceError::Upstream(msg) => AppError::SampleSource(msg),
        }
    }
}

impl From<BuildError> for AppError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::InsufficientSamples { got, min } => {
                AppError::InsufficientSamples { got, min }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::InsufficientSamples { got, min } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INSUFFICIENT_SAMPLES",
                format!(
                    "Voice analysis needs at least {min} published posts; only {got} available"
                ),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::SampleSource(msg) => {
                tracing::error!("Sample source error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SAMPLE_SOURCE_ERROR",
                    "Could not fetch posts from the sample source".to_string(),
                )
            }
            AppError::Generation(msg) => {
                tracing::error!("Generation error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_FAILED",
                    "Variant generation failed; please retry".to_string(),
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
