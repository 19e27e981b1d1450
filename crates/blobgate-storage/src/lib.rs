//! Blobgate Storage Library
//!
//! This crate provides the `Storage` capability trait the HTTP handlers talk to,
//! an `object_store`-backed implementation for Google Cloud Storage (and an
//! in-memory store for development), V4 signed upload URLs, and the path policy
//! that decides which keys uploads land on and which keys may be deleted.
//!
//! # Key format
//!
//! - **Direct uploads**: `{folder}/{base}-{YYYYMMDDHHMMSS}{ext}`
//! - **Signed uploads**: `{prefix}{YYYYMMDD_HHMMSS}_{sanitized name}`
//!
//! Key generation lives in the `keys` module so every caller derives the same layout.

pub mod factory;
pub mod gcs;
pub mod keys;
pub mod object;
pub mod provider;
pub mod signer;
pub mod traits;

// Re-export commonly used types
pub use blobgate_core::StorageBackend;
pub use factory::create_storage;
pub use object::ObjectStorage;
pub use provider::StorageProvider;
pub use signer::{GcsV4Signer, UrlSigner};
pub use traits::{Storage, StorageError, StorageResult};
