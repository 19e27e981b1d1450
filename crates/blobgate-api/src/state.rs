//! Application state shared by all handlers.

use blobgate_core::Config;
use blobgate_storage::{Storage, StorageProvider};
use std::sync::Arc;

/// Read-only state behind every request.
///
/// The storage client is built lazily by [`StorageProvider`] so the server can
/// start, and answer `/health`, before GCS credentials are available.
pub struct AppState {
    pub config: Config,
    pub storage: StorageProvider,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let storage = StorageProvider::new(config.clone());
        Self { config, storage }
    }

    /// State backed by an already constructed storage client.
    pub fn with_storage(config: Config, storage: Arc<dyn Storage>) -> Self {
        let provider = StorageProvider::with_storage(config.clone(), storage);
        Self {
            config,
            storage: provider,
        }
    }
}
