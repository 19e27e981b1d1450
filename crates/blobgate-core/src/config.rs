//! Configuration module
//!
//! Everything is read from environment variables (a `.env` file is honoured when
//! present). Server settings are validated at startup; the GCS credentials are
//! only checked when storage is first used, so the process can boot and answer
//! health checks without them.

use std::env;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 3000;
const SIGN_TTL_SECS: u64 = 60;
/// GCS rejects V4 signatures valid for longer than seven days.
const MAX_SIGN_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const MAX_BODY_SIZE_MB: usize = 25;
const UPLOAD_FOLDER: &str = "test";

/// GCS connection settings. Every field is optional here; the storage
/// provider reports the missing ones when it first builds a client.
#[derive(Clone, Debug, Default)]
pub struct GcsConfig {
    pub bucket: Option<String>,
    pub project_id: Option<String>,
    pub service_account_key_b64: Option<String>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_allow_origins: Vec<String>,
    pub storage_backend: StorageBackend,
    pub gcs: GcsConfig,
    pub delete_enabled: bool,
    /// Restriction prefix with leading slashes removed; `None` when unset or empty.
    pub path_prefix: Option<String>,
    pub sign_ttl_secs: u64,
    pub upload_folder: String,
    pub max_body_size_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            cors_allow_origins: vec!["*".to_string()],
            storage_backend: StorageBackend::Gcs,
            gcs: GcsConfig::default(),
            delete_enabled: false,
            path_prefix: None,
            sign_ttl_secs: SIGN_TTL_SECS,
            upload_folder: UPLOAD_FOLDER.to_string(),
            max_body_size_bytes: MAX_BODY_SIZE_MB * 1024 * 1024,
        }
    }
}

/// Parse a boolean feature flag.
///
/// Accepts `1/true/yes/y/on` and `0/false/no/n/off` (case-insensitive, trimmed);
/// anything else, including an unset variable, yields `default`.
pub fn parse_bool_flag(value: Option<&str>, default: bool) -> bool {
    let Some(value) = value else {
        return default;
    };
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => true,
        "0" | "false" | "no" | "n" | "off" => false,
        _ => default,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_allow_origins: Vec<String> = lookup("CORS_ALLOW_ORIGIN")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let storage_backend = match non_empty(lookup("STORAGE_BACKEND")) {
            Some(value) => value.parse()?,
            None => StorageBackend::Gcs,
        };

        let path_prefix = lookup("GCS_DOC_PREFIX")
            .map(|p| p.trim().trim_start_matches('/').to_string())
            .filter(|p| !p.is_empty());

        let max_body_size_mb: usize = match non_empty(lookup("MAX_BODY_SIZE_MB")) {
            Some(mb) => mb
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_BODY_SIZE_MB must be a whole number of megabytes"))?,
            None => MAX_BODY_SIZE_MB,
        };
        let max_body_size_bytes = max_body_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("MAX_BODY_SIZE_MB is too large"))?;

        let config = Config {
            server_port: match non_empty(lookup("PORT")) {
                Some(port) => port
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
                None => SERVER_PORT,
            },
            environment,
            cors_allow_origins: if cors_allow_origins.is_empty() {
                vec!["*".to_string()]
            } else {
                cors_allow_origins
            },
            storage_backend,
            gcs: GcsConfig {
                bucket: non_empty(lookup("GCS_BUCKET")),
                project_id: non_empty(lookup("GCS_PROJECT_ID")),
                service_account_key_b64: non_empty(lookup("GCS_SA_KEY_B64")),
            },
            delete_enabled: parse_bool_flag(lookup("GCS_DELETE_ENABLED").as_deref(), false),
            path_prefix,
            sign_ttl_secs: match non_empty(lookup("SIGN_TTL_S")) {
                Some(ttl) => ttl
                    .parse()
                    .map_err(|_| anyhow::anyhow!("SIGN_TTL_S must be a whole number of seconds"))?,
                None => SIGN_TTL_SECS,
            },
            upload_folder: non_empty(lookup("UPLOAD_FOLDER"))
                .map(|f| f.trim_matches('/').to_string())
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| UPLOAD_FOLDER.to_string()),
            max_body_size_bytes,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.sign_ttl_secs == 0 || self.sign_ttl_secs > MAX_SIGN_TTL_SECS {
            return Err(anyhow::anyhow!(
                "SIGN_TTL_S must be between 1 and {} seconds",
                MAX_SIGN_TTL_SECS
            ));
        }

        if self.max_body_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_BODY_SIZE_MB must be greater than zero"));
        }

        if self.is_production() && self.cors_allow_origins.iter().any(|o| o == "*") {
            tracing::warn!("CORS_ALLOW_ORIGIN is '*' in production");
        }

        Ok(())
    }

    /// Whether any origin may call the API.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_allow_origins.iter().any(|o| o == "*")
    }
}
