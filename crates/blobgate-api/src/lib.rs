//! Blobgate API Library
//!
//! This crate provides the HTTP handlers, error rendering, and application setup
//! for the blob proxy.

// Module declarations
mod api_doc;
pub mod constants;
mod handlers;
mod middleware;
pub mod setup;
mod telemetry;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
