//! V4 signed URLs for direct uploads to Google Cloud Storage.
//!
//! The URL is signed with the service account's RSA key and binds the HTTP
//! method, the object, the expiry and the `Content-Type` header, so the client
//! must `PUT` with exactly the content type it asked for.

use crate::gcs::ServiceAccountKey;
use crate::traits::{StorageError, StorageResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};
use std::time::Duration;

const GCS_HOST: &str = "storage.googleapis.com";
const SIGNING_ALGORITHM: &str = "GOOG4-RSA-SHA256";
const SIGNED_HEADERS: &str = "content-type;host";
/// Longest validity GCS accepts for a V4 signature.
pub const MAX_SIGNED_URL_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// RFC 3986 unreserved characters stay as-is, everything else is escaped.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');
const URI_PATH: &AsciiSet = &URI_COMPONENT.remove(b'/');

/// Issues pre-authorized upload URLs.
pub trait UrlSigner: Send + Sync {
    fn signed_put_url(
        &self,
        bucket: &str,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;
}

/// Signs GCS XML API URLs with the V4 scheme.
#[derive(Clone)]
pub struct GcsV4Signer {
    client_email: String,
    key: EncodingKey,
}

impl GcsV4Signer {
    pub fn from_service_account(account: &ServiceAccountKey) -> StorageResult<Self> {
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes()).map_err(|e| {
            StorageError::ConfigError(format!("Invalid service account private key: {}", e))
        })?;
        Ok(Self {
            client_email: account.client_email.clone(),
            key,
        })
    }

    /// Sign a `PUT` URL as of `now`.
    pub fn signed_put_url_at(
        &self,
        bucket: &str,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
        now: DateTime<Utc>,
    ) -> StorageResult<String> {
        if expires_in.is_zero() || expires_in > MAX_SIGNED_URL_EXPIRY {
            return Err(StorageError::SigningFailed(format!(
                "expiry must be between 1 and {} seconds",
                MAX_SIGNED_URL_EXPIRY.as_secs()
            )));
        }

        let request = CanonicalRequest::new(
            bucket,
            storage_key,
            content_type,
            &self.client_email,
            expires_in,
            now,
        );
        let string_to_sign = request.string_to_sign();

        let signature = jsonwebtoken::crypto::sign(
            string_to_sign.as_bytes(),
            &self.key,
            Algorithm::RS256,
        )
        .map_err(|e| StorageError::SigningFailed(e.to_string()))?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;

        Ok(format!(
            "https://{}{}?{}&X-Goog-Signature={}",
            GCS_HOST,
            request.path,
            request.query,
            hex::encode(signature)
        ))
    }
}

impl UrlSigner for GcsV4Signer {
    fn signed_put_url(
        &self,
        bucket: &str,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.signed_put_url_at(bucket, storage_key, content_type, expires_in, Utc::now())
    }
}

/// The pieces of a V4 canonical request for a `PUT`.
struct CanonicalRequest {
    path: String,
    query: String,
    headers: String,
    datetime: String,
    scope: String,
}

impl CanonicalRequest {
    fn new(
        bucket: &str,
        storage_key: &str,
        content_type: &str,
        client_email: &str,
        expires_in: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let datetime = now.format("%Y%m%dT%H%M%SZ").to_string();
        let scope = format!("{}/auto/storage/goog4_request", now.format("%Y%m%d"));
        let credential = format!("{}/{}", client_email, scope);

        let path = format!(
            "/{}/{}",
            utf8_percent_encode(bucket, URI_COMPONENT),
            utf8_percent_encode(storage_key, URI_PATH)
        );

        // Parameter names are already in lexicographic order.
        let params = [
            ("X-Goog-Algorithm", SIGNING_ALGORITHM.to_string()),
            ("X-Goog-Credential", credential),
            ("X-Goog-Date", datetime.clone()),
            ("X-Goog-Expires", expires_in.as_secs().to_string()),
            ("X-Goog-SignedHeaders", SIGNED_HEADERS.to_string()),
        ];
        let query = params
            .iter()
            .map(|(name, value)| format!("{}={}", name, utf8_percent_encode(value, URI_COMPONENT)))
            .collect::<Vec<_>>()
            .join("&");

        let headers = format!("content-type:{}\nhost:{}\n", content_type.trim(), GCS_HOST);

        Self {
            path,
            query,
            headers,
            datetime,
            scope,
        }
    }

    fn canonical(&self) -> String {
        [
            "PUT",
            &self.path,
            &self.query,
            &self.headers,
            SIGNED_HEADERS,
            "UNSIGNED-PAYLOAD",
        ]
        .join("\n")
    }

    fn string_to_sign(&self) -> String {
        let digest = Sha256::digest(self.canonical().as_bytes());
        format!(
            "{}\n{}\n{}\n{}",
            SIGNING_ALGORITHM,
            self.datetime,
            self.scope,
            hex::encode(digest)
        )
    }
}
