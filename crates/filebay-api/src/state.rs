//! Application state shared across request handlers.

use filebay_core::{Config, UploadPolicy};
use filebay_storage::LocalStore;

/// Main application state: storage root handle, upload policy, and config.
///
/// All fields are immutable after startup; handlers share it via `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: LocalStore,
    pub policy: UploadPolicy,
    pub config: Config,
}

const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppState>();
};
