//! Route paths
//!
//! Handler `utoipa::path` annotations repeat these literals; keep them in sync.

pub const UPLOAD_PATH: &str = "/api/blob/upload";
pub const FETCH_PATH: &str = "/api/blob/fetch";
pub const DELETE_PATH: &str = "/api/blob/delete";
pub const SIGN_PATH: &str = "/api/blob/sign";

pub const HEALTH_PATH: &str = "/health";
pub const OPENAPI_PATH: &str = "/api/openapi.json";

/// Content type stored and served when the client does not name one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Name used for direct uploads that arrive without `?name=`.
pub const DEFAULT_UPLOAD_NAME: &str = "Lease.pdf";

/// Largest file a signed upload URL is issued for (25 MiB).
pub const MAX_SIGNED_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// The only content type signed uploads accept.
pub const SIGNED_UPLOAD_CONTENT_TYPE: &str = "application/pdf";
