//! Storage abstraction trait
//!
//! This module defines the capabilities the HTTP layer needs from a bucket.

use crate::StorageBackend;
use async_trait::async_trait;
use blobgate_core::AppError;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::ConfigError(msg) => AppError::Configuration(msg),
            StorageError::UploadFailed(msg)
            | StorageError::DownloadFailed(msg)
            | StorageError::DeleteFailed(msg)
            | StorageError::BackendError(msg)
            | StorageError::SigningFailed(msg) => AppError::Backend(msg),
        }
    }
}

/// Storage abstraction trait
///
/// Handlers depend on this trait only, so the remote bucket can be swapped for
/// an in-memory store in development and tests.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `storage_key`, recording `content_type` as object metadata.
    async fn put_object(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Download an object's bytes
    async fn download(&self, storage_key: &str) -> StorageResult<Bytes>;

    /// Content type recorded for the object, if any.
    async fn content_type(&self, storage_key: &str) -> StorageResult<Option<String>>;

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Delete an object. A missing object is not an error.
    async fn delete_if_exists(&self, storage_key: &str) -> StorageResult<()>;

    /// Generate a time-limited URL that lets a client `PUT` exactly one object
    /// with exactly `content_type`.
    async fn signed_upload_url(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Name of the bucket this storage writes to
    fn bucket(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
