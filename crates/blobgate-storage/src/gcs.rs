//! Google Cloud Storage client construction.
//!
//! Credentials arrive as a base64-encoded service account JSON document. It is
//! decoded once, handed to `object_store` for object I/O, and its RSA key is
//! reused by [`GcsV4Signer`] for signed upload URLs.

use crate::object::ObjectStorage;
use crate::signer::GcsV4Signer;
use crate::traits::{StorageError, StorageResult};
use crate::StorageBackend;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use object_store::gcp::GoogleCloudStorageBuilder;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const INVALID_KEY_MESSAGE: &str = "invalid GCS service account key";

/// The fields of a service account key this service relies on.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Decode a base64 service account document.
///
/// Returns the parsed key together with the JSON document to hand to the GCS
/// client. Keys that went through a shell or CI secret store often carry
/// literal `\n` sequences instead of newlines; those are repaired in
/// `private_key`, in both the parsed key and the returned document.
pub fn decode_service_account(encoded: &str) -> StorageResult<(ServiceAccountKey, String)> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|e| {
        StorageError::ConfigError(format!("GCS_SA_KEY_B64 is not valid base64: {}", e))
    })?;
    let json = String::from_utf8(bytes).map_err(|e| {
        StorageError::ConfigError(format!("GCS_SA_KEY_B64 is not UTF-8: {}", e))
    })?;
    let mut document: Value = serde_json::from_str(&json).map_err(|e| {
        StorageError::ConfigError(format!(
            "GCS_SA_KEY_B64 is not JSON (line {}, column {})",
            e.line(),
            e.column()
        ))
    })?;

    if let Some(Value::String(pem)) = document.get_mut("private_key") {
        *pem = pem.replace("\\n", "\n");
    }

    let account = ServiceAccountKey::deserialize(&document).map_err(|e| {
        StorageError::ConfigError(format!("GCS_SA_KEY_B64 is not a service account key: {}", e))
    })?;
    Ok((account, document.to_string()))
}

/// Build the GCS-backed storage for `bucket`.
pub fn build_gcs_storage(
    bucket: &str,
    project_id: &str,
    service_account_key_b64: &str,
) -> StorageResult<ObjectStorage> {
    let (account, json) = decode_service_account(service_account_key_b64)?;

    if let Some(ref key_project) = account.project_id {
        if key_project != project_id {
            tracing::warn!(
                configured_project = %project_id,
                key_project = %key_project,
                "Service account belongs to a different project than GCS_PROJECT_ID"
            );
        }
    }

    let store = GoogleCloudStorageBuilder::new()
        .with_bucket_name(bucket)
        .with_service_account_key(json)
        .build()
        .map_err(|_| {
            // The builder's error text can quote the key bytes.
            tracing::error!(
                bucket = %bucket,
                client_email = %account.client_email,
                "GCS client construction rejected the service account key"
            );
            StorageError::ConfigError(INVALID_KEY_MESSAGE.to_string())
        })?;

    let signer = GcsV4Signer::from_service_account(&account)?;

    tracing::info!(
        bucket = %bucket,
        project_id = %project_id,
        client_email = %account.client_email,
        "GCS client initialized"
    );

    Ok(
        ObjectStorage::new(Arc::new(store), bucket, StorageBackend::Gcs)
            .with_signer(Arc::new(signer)),
    )
}
