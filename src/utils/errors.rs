//! Error handling for ASCESA
//!
//! This module defines the main error type used throughout the application
//! and the boundary that turns it into an HTTP response.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// SQLSTATE for unique constraint violations in PostgreSQL
const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE for foreign key violations in PostgreSQL
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Main error type for the ASCESA backend
#[derive(Error, Debug)]
pub enum AscesaError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Too many requests, please try again later.")]
    RateLimitExceeded,

    /// An error that already carries its HTTP status (extractor rejections, multipart)
    #[error("{message}")]
    Http { status: StatusCode, message: String },

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type alias for ASCESA operations
pub type Result<T> = std::result::Result<T, AscesaError>;

impl From<sqlx::Error> for AscesaError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AscesaError::NotFound("Record".to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => AscesaError::Conflict(
                    db_err
                        .constraint()
                        .map(|c| format!("duplicate value violates {}", c))
                        .unwrap_or_else(|| "duplicate value".to_string()),
                ),
                Some(FOREIGN_KEY_VIOLATION) => {
                    AscesaError::InvalidInput("referenced record does not exist".to_string())
                }
                _ => AscesaError::Database(err),
            },
            _ => AscesaError::Database(err),
        }
    }
}

impl From<argon2::password_hash::Error> for AscesaError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AscesaError::PasswordHash(err.to_string())
    }
}

impl From<MultipartError> for AscesaError {
    fn from(err: MultipartError) -> Self {
        AscesaError::Http {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<MultipartRejection> for AscesaError {
    fn from(rejection: MultipartRejection) -> Self {
        AscesaError::Http {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for AscesaError {
    fn from(rejection: JsonRejection) -> Self {
        AscesaError::Http {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AscesaError {
    fn from(rejection: QueryRejection) -> Self {
        AscesaError::Http {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AscesaError {
    fn from(rejection: PathRejection) -> Self {
        AscesaError::Http {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl AscesaError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AscesaError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AscesaError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AscesaError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AscesaError::NotFound(_) => StatusCode::NOT_FOUND,
            AscesaError::Conflict(_) => StatusCode::CONFLICT,
            AscesaError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AscesaError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AscesaError::Http { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client. Server-side details stay in the logs.
    pub fn client_message(&self) -> String {
        if self.status_code().is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            AscesaError::Database(_) => false,
            AscesaError::Migration(_) => false,
            AscesaError::Config(_) => false,
            AscesaError::Authentication(_) => false,
            AscesaError::PermissionDenied(_) => false,
            AscesaError::NotFound(_) => false,
            AscesaError::Conflict(_) => false,
            AscesaError::InvalidInput(_) => false,
            AscesaError::PayloadTooLarge(_) => false,
            AscesaError::RateLimitExceeded => true,
            AscesaError::Http { status, .. } => status.is_server_error(),
            AscesaError::Token(_) => false,
            AscesaError::PasswordHash(_) => false,
            AscesaError::Serialization(_) => false,
            AscesaError::Io(_) => true,
            AscesaError::Task(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AscesaError::Database(_) => ErrorSeverity::Critical,
            AscesaError::Migration(_) => ErrorSeverity::Critical,
            AscesaError::Config(_) => ErrorSeverity::Critical,
            AscesaError::PermissionDenied(_) => ErrorSeverity::Warning,
            AscesaError::Authentication(_) => ErrorSeverity::Warning,
            AscesaError::RateLimitExceeded => ErrorSeverity::Warning,
            AscesaError::InvalidInput(_)
            | AscesaError::NotFound(_)
            | AscesaError::Conflict(_)
            | AscesaError::PayloadTooLarge(_) => ErrorSeverity::Info,
            AscesaError::Http { status, .. } if status.is_client_error() => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// JSON error envelope returned to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: String,
    pub error: String,
    pub timestamp: String,
    pub path: Option<String>,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: String) -> Self {
        Self {
            status_code: status.as_u16(),
            message,
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            path: None,
        }
    }
}

impl IntoResponse for AscesaError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self.severity() {
            ErrorSeverity::Critical | ErrorSeverity::Error => {
                error!(error = %self, status = status.as_u16(), "Request failed");
            }
            _ => {
                tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
            }
        }

        let body = ErrorBody::new(status, self.client_message());
        let mut response = (status, Json(body.clone())).into_response();
        // The error-path middleware rewrites the body with the request path.
        response.extensions_mut().insert(body);
        response
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
