//! Lazily constructed, process-wide storage client.
//!
//! The client is built on first use rather than at startup so the service can
//! boot, and answer `/health`, before GCS credentials are in place. Once built,
//! every request shares the same instance. A failed build is not remembered:
//! the next request tries again with the same configuration.

use crate::factory::create_storage;
use crate::{Storage, StorageResult};
use blobgate_core::Config;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub struct StorageProvider {
    config: Config,
    cell: OnceCell<Arc<dyn Storage>>,
}

impl StorageProvider {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// Provider that hands out `storage` without ever consulting the configuration.
    pub fn with_storage(config: Config, storage: Arc<dyn Storage>) -> Self {
        Self {
            config,
            cell: OnceCell::new_with(Some(storage)),
        }
    }

    /// The shared client, built on the first call.
    pub async fn get_client(&self) -> StorageResult<Arc<dyn Storage>> {
        let storage = self
            .cell
            .get_or_try_init(|| async {
                tracing::debug!(
                    backend = %self.config.storage_backend,
                    "Initializing storage client"
                );
                create_storage(&self.config).await
            })
            .await?;
        Ok(Arc::clone(storage))
    }

    /// Bucket the shared client writes to.
    pub async fn bucket_name(&self) -> StorageResult<String> {
        Ok(self.get_client().await?.bucket().to_string())
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}
