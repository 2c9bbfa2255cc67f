//! Filebay Storage Library
//!
//! This crate owns the storage root: identifier generation, stored-name
//! composition, and safe placement/removal of files under concurrent requests.
//!
//! # Stored name format
//!
//! `{identifier}-{sanitized original name}` where the identifier is 8 random
//! alphanumeric characters followed by the Unix time in milliseconds encoded
//! base-36, and the sanitized name is a safe single path segment. The stored
//! name is the only record of identity; there are no sidecar metadata files.
//!
//! Safety comes from structure, not locks: names are unique by construction
//! (with a bounded existence check-and-retry on top), uploads land in a
//! temporary file and are renamed into place only once fully written, and
//! removal validates the canonical path against the canonical storage root.

pub mod error;
pub mod ident;
pub mod local;

// Re-export commonly used types
pub use error::{StoreError, StoreResult};
pub use local::{LocalStore, PlacedFile};
