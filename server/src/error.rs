//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use storefront_engine::{Error as EngineError, ValidationErrors};

use crate::backend::BackendError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("deletion not confirmed")]
    DeletionNotConfirmed,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<ValidationErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_to: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            fields: None,
            redirect_to: None,
        }
    }
}

impl AppError {
    fn engine_response(e: &EngineError) -> (StatusCode, ErrorResponse) {
        match e {
            EngineError::Validation(errors) => {
                tracing::debug!("Validation failed: {}", errors);
                let mut body = ErrorResponse::new("validation failed");
                body.fields = Some(errors.clone());
                (StatusCode::UNPROCESSABLE_ENTITY, body)
            }
            EngineError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorResponse::new(e.to_string())),
            EngineError::Unauthenticated { redirect_to } => {
                let mut body = ErrorResponse::new("authentication required");
                body.redirect_to = Some(redirect_to.clone());
                (StatusCode::UNAUTHORIZED, body)
            }
            EngineError::NotLoaded => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::new(e.to_string()),
            ),
            EngineError::RemoteUnavailable | EngineError::RemoteCallFailed(_) => {
                tracing::warn!("Engine error: {:?}", e);
                (StatusCode::BAD_GATEWAY, ErrorResponse::new(e.to_string()))
            }
            EngineError::PersistenceRead(_) => {
                tracing::error!("Engine error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(e.to_string()),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Engine(e) => Self::engine_response(e),
            AppError::Backend(BackendError::Unconfigured) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::new("remote service not configured"),
            ),
            AppError::Backend(BackendError::Status { status, message })
                if (400..500).contains(status) =>
            {
                // The service rejected the request itself, e.g. a taken email.
                (StatusCode::BAD_REQUEST, ErrorResponse::new(message.clone()))
            }
            AppError::Backend(e) => {
                tracing::error!("Backend error: {:?}", e);
                let mut body = ErrorResponse::new("backend request failed");
                body.details = Some(e.to_string());
                (StatusCode::BAD_GATEWAY, body)
            }
            AppError::UnknownResource(name) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(format!("unknown resource '{name}'")),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg.clone())),
            AppError::DeletionNotConfirmed => {
                (StatusCode::CONFLICT, ErrorResponse::new(self.to_string()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                let mut body = ErrorResponse::new("Internal server error");
                body.details = Some(msg.clone());
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;
