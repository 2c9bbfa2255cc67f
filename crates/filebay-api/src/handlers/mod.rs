//! Request handlers: the thin orchestration layer over the storage core.

pub mod delete;
pub mod health;
pub mod upload;
