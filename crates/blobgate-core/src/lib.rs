//! Blobgate Core Library
//!
//! This crate provides the error taxonomy, configuration, and storage backend
//! selection shared by the storage and API crates.

pub mod config;
pub mod error;
pub mod storage_types;

// Re-export commonly used types
pub use config::{parse_bool_flag, Config, GcsConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
