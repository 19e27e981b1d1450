use crate::keys::object_path;
use crate::signer::UrlSigner;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::memory::InMemory;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, GetOptions, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::sync::Arc;
use std::time::Duration;

/// Storage implementation on top of any `object_store` backend
#[derive(Clone)]
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    backend: StorageBackend,
    signer: Option<Arc<dyn UrlSigner>>,
}

impl ObjectStorage {
    /// Wrap an object store.
    ///
    /// # Arguments
    /// * `store` - The backend (GCS, in-memory, ...)
    /// * `bucket` - Bucket name, used for logging and URL signing
    /// * `backend` - Backend kind reported by [`Storage::backend_type`]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        backend: StorageBackend,
    ) -> Self {
        ObjectStorage {
            store,
            bucket: bucket.into(),
            backend,
            signer: None,
        }
    }

    /// Objects kept in process memory; gone when the process exits.
    pub fn in_memory(bucket: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemory::new()), bucket, StorageBackend::Memory)
    }

    /// Enable signed upload URLs.
    pub fn with_signer(mut self, signer: Arc<dyn UrlSigner>) -> Self {
        self.signer = Some(signer);
        self
    }
}

#[async_trait]
impl Storage for ObjectStorage {
    async fn put_object(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        let size = data.len() as u64;
        let location = object_path(storage_key)?;
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let mut options = PutOptions::default();
        options.attributes = attributes;

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(data), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object upload successful"
        );

        Ok(())
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Bytes> {
        let start = std::time::Instant::now();
        let location = object_path(storage_key)?;

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object download successful"
        );

        Ok(bytes)
    }

    async fn content_type(&self, storage_key: &str) -> StorageResult<Option<String>> {
        let location = object_path(storage_key)?;
        let mut options = GetOptions::default();
        options.head = true;

        let result: ObjectResult<_> = self.store.get_opts(&location, options).await;

        match result {
            Ok(result) => Ok(result
                .attributes
                .get(&Attribute::ContentType)
                .map(|value| value.to_string())),
            Err(ObjectStoreError::NotFound { .. }) => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let location = object_path(storage_key)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn delete_if_exists(&self, storage_key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let location = object_path(storage_key)?;

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(()) => {}
            Err(ObjectStoreError::NotFound { .. }) => {
                tracing::debug!(
                    bucket = %self.bucket,
                    key = %storage_key,
                    "Object already absent, nothing to delete"
                );
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object delete successful"
        );

        Ok(())
    }

    async fn signed_upload_url(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            StorageError::ConfigError(format!(
                "Signed upload URLs are not available for the {} storage backend",
                self.backend
            ))
        })?;
        signer.signed_put_url(&self.bucket, storage_key, content_type, expires_in)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}
