//! Storage root setup

use anyhow::{Context, Result};
use filebay_core::Config;
use filebay_storage::LocalStore;

/// Create the storage root if absent and return the handle handlers share.
pub async fn setup_storage(config: &Config) -> Result<LocalStore> {
    tracing::info!(
        uploads_dir = %config.uploads_dir.display(),
        "Initializing storage root"
    );

    let store = LocalStore::new(&config.uploads_dir, config.uploads_base_url.clone())
        .await
        .context("Failed to initialize storage root")?;

    Ok(store)
}
