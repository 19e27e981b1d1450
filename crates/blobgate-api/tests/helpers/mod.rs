#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use blobgate_api::setup::routes::setup_routes;
use blobgate_api::AppState;
use blobgate_core::{Config, GcsConfig, StorageBackend};
use blobgate_storage::{
    ObjectStorage, Storage, StorageError, StorageResult, UrlSigner,
};
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const TEST_BUCKET: &str = "leases";

/// Signs nothing; produces a recognizable URL.
pub struct FakeSigner;

impl UrlSigner for FakeSigner {
    fn signed_put_url(
        &self,
        bucket: &str,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        Ok(format!(
            "https://storage.test/{}/{}?X-Goog-Expires={}&ct={}",
            bucket,
            storage_key,
            expires_in.as_secs(),
            content_type
        ))
    }
}

/// In-memory storage that counts every backend call. It can be told to fail
/// deletes of one key, every upload, every download, or metadata lookups.
pub struct CountingStorage {
    inner: ObjectStorage,
    calls: AtomicUsize,
    failing_delete: Option<String>,
    failing_put: Option<String>,
    failing_download: Option<String>,
    failing_content_type: bool,
}

impl CountingStorage {
    pub fn new() -> Self {
        Self {
            inner: ObjectStorage::in_memory(TEST_BUCKET).with_signer(Arc::new(FakeSigner)),
            calls: AtomicUsize::new(0),
            failing_delete: None,
            failing_put: None,
            failing_download: None,
            failing_content_type: false,
        }
    }

    pub fn failing_delete(mut self, key: &str) -> Self {
        self.failing_delete = Some(key.to_string());
        self
    }

    /// Every upload fails with `message`.
    pub fn failing_put(mut self, message: &str) -> Self {
        self.failing_put = Some(message.to_string());
        self
    }

    /// Every download fails with `message`.
    pub fn failing_download(mut self, message: &str) -> Self {
        self.failing_download = Some(message.to_string());
        self
    }

    pub fn failing_content_type(mut self) -> Self {
        self.failing_content_type = true;
        self
    }

    /// Store an object directly, bypassing the failure switches.
    pub async fn seed(&self, storage_key: &str, data: &'static [u8], content_type: &str) {
        self.inner
            .put_object(storage_key, Bytes::from_static(data), content_type)
            .await
            .expect("Failed to seed object");
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for CountingStorage {
    async fn put_object(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        self.record();
        if let Some(ref message) = self.failing_put {
            return Err(StorageError::UploadFailed(message.clone()));
        }
        self.inner.put_object(storage_key, data, content_type).await
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Bytes> {
        self.record();
        if let Some(ref message) = self.failing_download {
            return Err(StorageError::DownloadFailed(message.clone()));
        }
        self.inner.download(storage_key).await
    }

    async fn content_type(&self, storage_key: &str) -> StorageResult<Option<String>> {
        self.record();
        if self.failing_content_type {
            return Err(StorageError::BackendError("metadata unavailable".to_string()));
        }
        self.inner.content_type(storage_key).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.record();
        self.inner.exists(storage_key).await
    }

    async fn delete_if_exists(&self, storage_key: &str) -> StorageResult<()> {
        self.record();
        if self.failing_delete.as_deref() == Some(storage_key) {
            return Err(StorageError::DeleteFailed("permission denied".to_string()));
        }
        self.inner.delete_if_exists(storage_key).await
    }

    async fn signed_upload_url(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.record();
        self.inner
            .signed_upload_url(storage_key, content_type, expires_in)
            .await
    }

    fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}

/// Test application
pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<CountingStorage>,
}

impl TestApp {
    /// Get the HTTP test client
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// Configuration for tests: in-memory backend, deletes enabled, no prefix.
pub fn test_config() -> Config {
    Config {
        storage_backend: StorageBackend::Memory,
        gcs: GcsConfig {
            bucket: Some(TEST_BUCKET.to_string()),
            ..GcsConfig::default()
        },
        delete_enabled: true,
        ..Config::default()
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(test_config(), CountingStorage::new())
}

pub fn setup_test_app_with(config: Config, storage: CountingStorage) -> TestApp {
    let storage = Arc::new(storage);
    let state = Arc::new(AppState::with_storage(config.clone(), storage.clone()));
    let app = setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(app).expect("Failed to create test server");
    TestApp { server, storage }
}

/// App whose storage can never be built: GCS backend with no credentials.
pub fn setup_unconfigured_app() -> TestServer {
    let config = Config::default();
    let state = Arc::new(AppState::new(config.clone()));
    let app = setup_routes(&config, state).expect("Failed to build routes");
    TestServer::new(app).expect("Failed to create test server")
}
