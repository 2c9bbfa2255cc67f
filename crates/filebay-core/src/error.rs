//! Error types module
//!
//! All request failures are unified under the `AppError` enum, one variant per
//! member of the error taxonomy. `ErrorMetadata` lets each error self-describe
//! its HTTP presentation; client messages never carry filesystem paths.

use crate::validation::ValidationError;

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

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "unsupported_type")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("file too large: {0}")]
    PayloadTooLarge(String),

    #[error("file name is missing")]
    MissingName,

    #[error("invalid file name: {0}")]
    InvalidName(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        match self {
            AppError::UnsupportedType(_)
            | AppError::PayloadTooLarge(_)
            | AppError::MissingName
            | AppError::InvalidName(_)
            | AppError::InvalidInput(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::Io(_) => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::UnsupportedType(_) => "unsupported_type",
            AppError::PayloadTooLarge(_) => "too_large",
            AppError::MissingName => "missing_name",
            AppError::InvalidName(_) => "invalid_name",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Io(_) => "io_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::UnsupportedType(msg) => msg.clone(),
            AppError::PayloadTooLarge(msg) => msg.clone(),
            AppError::MissingName => "File name is required".to_string(),
            AppError::InvalidName(_) => "Invalid file name".to_string(),
            AppError::NotFound(_) => "File not found".to_string(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::Io(_) => "Internal server error".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::Io(_) => LogLevel::Error,
            _ => LogLevel::Debug,
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UnsupportedType {
                content_type,
                allowed,
            } => AppError::UnsupportedType(format!(
                "Unsupported content type '{}'. Allowed types: {}",
                content_type,
                allowed.join(", ")
            )),
            ValidationError::TooLarge { max, .. } => AppError::PayloadTooLarge(format!(
                "File exceeds maximum allowed size of {} MB",
                max / 1024 / 1024
            )),
        }
    }
}
