//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::Result;
use blobgate_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Initialize telemetry first
    crate::telemetry::init_telemetry()?;

    tracing::info!(
        environment = %config.environment,
        storage_backend = %config.storage_backend,
        bucket = ?config.gcs.bucket,
        delete_enabled = config.delete_enabled,
        path_prefix = ?config.path_prefix,
        sign_ttl_secs = config.sign_ttl_secs,
        "Configuration loaded and validated successfully"
    );

    if config.gcs.service_account_key_b64.is_none() {
        tracing::warn!("GCS_SA_KEY_B64 is not set; storage requests will fail until it is");
    }

    // Storage is connected lazily on the first request that needs it
    let state = Arc::new(AppState::new(config.clone()));

    // Setup routes
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
