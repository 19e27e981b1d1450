use crate::gcs::build_gcs_storage;
use crate::{ObjectStorage, Storage, StorageBackend, StorageError, StorageResult};
use blobgate_core::Config;
use std::sync::Arc;

/// Bucket name reported by the in-memory backend when `GCS_BUCKET` is unset.
const MEMORY_BUCKET: &str = "memory";

fn required<'a>(value: Option<&'a str>, name: &str) -> StorageResult<&'a str> {
    value.ok_or_else(|| StorageError::ConfigError(format!("Missing {}", name)))
}

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        StorageBackend::Gcs => {
            let bucket = required(config.gcs.bucket.as_deref(), "GCS_BUCKET")?;
            let project_id = required(config.gcs.project_id.as_deref(), "GCS_PROJECT_ID")?;
            let key = required(
                config.gcs.service_account_key_b64.as_deref(),
                "GCS_SA_KEY_B64",
            )?;

            let storage = build_gcs_storage(bucket, project_id, key)?;
            Ok(Arc::new(storage))
        }

        StorageBackend::Memory => {
            let bucket = config.gcs.bucket.as_deref().unwrap_or(MEMORY_BUCKET);
            tracing::warn!(
                bucket = %bucket,
                "Using in-memory storage; objects are lost on restart"
            );
            Ok(Arc::new(ObjectStorage::in_memory(bucket)))
        }
    }
}
