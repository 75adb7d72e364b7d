//! Error types module
//!
//! All errors in the application are unified under the `AppError` enum so
//! the HTTP layer can translate any failure into a consistent response.
//! Each variant knows its HTTP status, a machine-readable code, the message
//! that is safe to show a client, and the severity it should be logged at.

use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code to return for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::Database(_) => 500,
            AppError::Detection(_) => 422,
            AppError::InvalidInput(_) => 400,
            AppError::PayloadTooLarge(_) => 413,
            AppError::Unauthorized(_) => 401,
            AppError::Internal(_) => 500,
        }
    }

    /// Machine-readable error code for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Detection(_) => "detection_failed",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Client-facing message. Server-side failures and auth failures are
    /// collapsed to generic text; the detailed message only goes to the log.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Database operation failed".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Unauthorized(_) => "Invalid or expired token".to_string(),
            other => other.to_string(),
        }
    }

    /// Log level for this error.
    pub fn log_level(&self) -> LogLevel {
        match self {
            AppError::InvalidInput(_) | AppError::PayloadTooLarge(_) => LogLevel::Debug,
            AppError::Unauthorized(_) | AppError::Detection(_) => LogLevel::Warn,
            AppError::Database(_) | AppError::Internal(_) => LogLevel::Error,
        }
    }
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}
