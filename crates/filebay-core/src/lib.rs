//! Filebay Core Library
//!
//! This crate provides configuration, the error taxonomy, and the upload
//! policy (content validation) shared across all Filebay components.

pub mod config;
pub mod error;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use validation::{
    UploadPolicy, ValidationError, DEFAULT_ALLOWED_CONTENT_TYPES, DEFAULT_MAX_UPLOAD_BYTES,
};
