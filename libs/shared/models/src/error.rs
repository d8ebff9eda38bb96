use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use thiserror::Error;

/// API-level failure. Every variant carries a stable machine-readable code
/// that ends up in the `{ error: { code, message } }` envelope; the request
/// path is attached by the envelope middleware in shared-utils.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized [{code}]: {message}")]
    Unauthorized { code: &'static str, message: String },

    #[error("Forbidden [{code}]: {message}")]
    Forbidden { code: &'static str, message: String },

    #[error("Not Found [{code}]: {message}")]
    NotFound { code: &'static str, message: String },

    #[error("Conflict [{code}]: {message}")]
    Conflict { code: &'static str, message: String },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Unauthorized { code, message: message.into() }
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Forbidden { code, message: message.into() }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        AppError::NotFound { code, message: message.into() }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Conflict { code, message: message.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation { message: message.into(), details: None }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. } => code,
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::Unauthorized { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::Validation { message, .. } => message,
            AppError::Internal(message) => message,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!("Error: {}: {}", status, self);

        let mut error = json!({
            "code": self.code(),
            "message": self.message(),
        });
        if let AppError::Validation { details: Some(details), .. } = &self {
            error["details"] = details.clone();
        }

        let body = Json(json!({
            "error": error,
            "timestamp": Utc::now().to_rfc3339(),
            "path": "",
        }));

        (status, body).into_response()
    }
}
