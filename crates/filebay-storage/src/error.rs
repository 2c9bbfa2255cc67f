//! Storage operation errors.

use filebay_core::ValidationError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file name is missing")]
    MissingName,

    #[error("invalid file name: {0}")]
    InvalidName(String),

    #[error("file not found: {0}")]
    NotFound(String),

    /// Upload rejected by the content validator (unsupported type, or the
    /// byte ceiling was exceeded mid-stream).
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// The transport refused the request body before the policy ceiling was
    /// reached, e.g. multipart framing pushed it over the outer body limit.
    #[error("request body exceeded the transport limit")]
    BodyLimit,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("storage configuration error: {0}")]
    Config(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
