//! Error types for SocialHub
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Each variant maps to one HTTP status and one machine-stable
/// error code that clients can match on.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Resource not found")]
    NotFound,

    /// Authentication required (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Actor is authenticated but not allowed to do this (403)
    #[error("You do not have permission to perform this action")]
    Forbidden,

    /// Bad or duplicate input (400)
    #[error("{message}")]
    Validation {
        field: Option<&'static str>,
        message: String,
    },

    /// Login with unknown user or wrong password (400)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A user tried to follow themselves (400)
    #[error("You cannot follow yourself")]
    SelfFollow,

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token signing / password hashing error (500)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Validation error attached to a single input field.
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: Some(field),
            message: message.into(),
        }
    }

    /// Validation error not tied to a specific field.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation { .. } | AppError::InvalidCredentials | AppError::SelfFollow => {
                StatusCode::BAD_REQUEST
            }
            AppError::Database(_)
            | AppError::Config(_)
            | AppError::Encryption(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-stable error code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::Validation { .. } => "validation",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::SelfFollow => "self_follow",
            AppError::Database(_) => "database",
            AppError::Config(_) => "config",
            AppError::Encryption(_) => "encryption",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Server-side failures are logged and reported with a generic
    /// message so that SQL or config details never reach the client.
    fn into_response(self) -> Response {
        use axum::Json;

        let status = self.status();
        let code = self.code();

        let message = match &self {
            AppError::Database(error) => {
                tracing::error!(%error, "Database error while handling request");
                "Database error".to_string()
            }
            AppError::Internal(error) => {
                tracing::error!(%error, "Internal error while handling request");
                "Internal server error".to_string()
            }
            AppError::Config(_) | AppError::Encryption(_) => {
                tracing::error!(error = %self, "Server error while handling request");
                self.to_string()
            }
            _ => self.to_string(),
        };

        crate::metrics::ERRORS_TOTAL.with_label_values(&[code]).inc();

        let mut body = serde_json::json!({
            "error": message,
            "code": code,
        });
        if let AppError::Validation {
            field: Some(field), ..
        } = &self
        {
            body["field"] = serde_json::Value::from(*field);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
