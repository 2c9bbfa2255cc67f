//! Application setup and initialization
//!
//! All application initialization logic lives here rather than in main.rs,
//! so integration tests can assemble the same router over a scratch root.

pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use filebay_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_tracing();
    tracing::info!("Configuration loaded and validated successfully");

    // Setup storage root (fatal if not creatable)
    let store = storage::setup_storage(&config).await?;

    let state = Arc::new(AppState {
        store,
        policy: config.upload_policy(),
        config: config.clone(),
    });

    let router = routes::build_router(&config, state.clone())?;

    Ok((state, router))
}
