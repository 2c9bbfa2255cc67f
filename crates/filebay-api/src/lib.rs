//! Filebay API Library
//!
//! This crate provides the HTTP handlers and application setup for the file
//! intake service: multipart upload, deletion by name, and static serving of
//! the storage root.

// Module declarations
mod handlers;
mod telemetry;

// Public modules
pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use error::ErrorResponse;
