//! Path policy: key derivation and prefix restriction.
//!
//! Direct uploads land on `{folder}/{base}-{YYYYMMDDHHMMSS}{ext}`; signed uploads
//! on `{prefix}{YYYYMMDD_HHMMSS}_{sanitized name}`. Every path coming from a
//! client goes through [`normalize_path`] before it is checked or used.

use crate::traits::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Prefix used for signed uploads when no restriction prefix is configured.
pub const DEFAULT_SIGNED_UPLOAD_PREFIX: &str = "tmp/";

static UNSAFE_NAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9_.\-]+").expect("static file name pattern is valid")
});

/// Trim whitespace and strip every leading `/`.
pub fn normalize_path(path: &str) -> String {
    path.trim().trim_start_matches('/').to_string()
}

/// Replace every run of characters outside `[A-Za-z0-9_.-]` with a single `_`.
pub fn sanitize_file_name(name: &str) -> String {
    UNSAFE_NAME_CHARS.replace_all(name, "_").into_owned()
}

/// `YYYYMMDD_HHMMSS`
pub fn compact_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// `YYYYMMDDHHMMSS`
fn digits_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

fn require_name(name: &str) -> StorageResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StorageError::InvalidKey(
            "file name must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Folder for signed uploads: the configured prefix without leading slashes and
/// with exactly one trailing slash, or `tmp/` when none is configured.
pub fn signed_upload_prefix(prefix: Option<&str>) -> String {
    let trimmed = prefix
        .map(|p| p.trim().trim_start_matches('/').trim_end_matches('/'))
        .unwrap_or_default();
    if trimmed.is_empty() {
        DEFAULT_SIGNED_UPLOAD_PREFIX.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

/// Key for a signed (direct-to-bucket) upload.
pub fn signed_upload_key(
    prefix: Option<&str>,
    file_name: &str,
    at: DateTime<Utc>,
) -> StorageResult<String> {
    let name = require_name(file_name)?;
    Ok(format!(
        "{}{}_{}",
        signed_upload_prefix(prefix),
        compact_timestamp(at),
        sanitize_file_name(name)
    ))
}

/// Key for an upload proxied through the service. The original name is split
/// at its last dot so the timestamp sits between base name and extension.
pub fn direct_upload_key(folder: &str, file_name: &str, at: DateTime<Utc>) -> StorageResult<String> {
    let name = require_name(file_name)?;
    let (base, ext) = match name.rfind('.') {
        Some(dot) => name.split_at(dot),
        None => (name, ""),
    };
    let folder = folder.trim_matches('/');
    let file = format!("{}-{}{}", base, digits_timestamp(at), ext);
    if folder.is_empty() {
        Ok(file)
    } else {
        Ok(format!("{}/{}", folder, file))
    }
}

/// `prefix unset OR path starts with prefix`
pub fn is_allowed(path: &str, prefix: Option<&str>) -> bool {
    match prefix {
        Some(prefix) if !prefix.is_empty() => path.starts_with(prefix),
        _ => true,
    }
}

/// Parse a key into an object location, rejecting keys the bucket would
/// otherwise store under a different name: empty segments (`a//b`), `.` or
/// `..` segments, and control characters.
pub fn object_path(key: &str) -> StorageResult<object_store::path::Path> {
    object_store::path::Path::parse(key)
        .map_err(|e| StorageError::InvalidKey(format!("invalid path {}: {}", key, e)))
}

/// Every path that falls outside the restriction prefix, in input order.
pub fn denied_paths<'a, I>(paths: I, prefix: Option<&str>) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    paths
        .into_iter()
        .filter(|p| !is_allowed(p, prefix))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 22, 19, 27, 40).unwrap()
    }

    #[test]
    fn test_object_path_keeps_keys_verbatim() {
        let path = object_path("test/Lease #2 [v1]-20240102030405.pdf").unwrap();
        assert_eq!(path.to_string(), "test/Lease #2 [v1]-20240102030405.pdf");

        for bad in ["tmp//important.pdf", "tmp/../x.pdf", "tmp/./x.pdf"] {
            assert!(
                matches!(object_path(bad), Err(StorageError::InvalidKey(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_normalize_path_strips_leading_slashes() {
        assert_eq!(normalize_path("///tmp/a.pdf"), "tmp/a.pdf");
        assert_eq!(normalize_path("  /tmp/a.pdf "), "tmp/a.pdf");
        assert_eq!(normalize_path("tmp/a.pdf"), "tmp/a.pdf");
        assert_eq!(normalize_path(" // "), "");
    }

    #[test]
    fn test_sanitize_collapses_runs() {
        assert_eq!(sanitize_file_name("my lease (final).pdf"), "my_lease_final_.pdf");
        assert_eq!(sanitize_file_name("a/b\\c.pdf"), "a_b_c.pdf");
        assert_eq!(sanitize_file_name("Mietvertrag-ä.pdf"), "Mietvertrag-_.pdf");
        assert_eq!(sanitize_file_name("ok_name-1.2.pdf"), "ok_name-1.2.pdf");
    }

    #[test]
    fn test_compact_timestamp_format() {
        assert_eq!(compact_timestamp(at()), "20250922_192740");
    }

    #[test]
    fn test_signed_upload_key_uses_default_prefix() {
        let key = signed_upload_key(None, "lease.pdf", at()).unwrap();
        assert_eq!(key, "tmp/20250922_192740_lease.pdf");
    }

    #[test]
    fn test_signed_upload_key_starts_with_configured_prefix() {
        for prefix in ["docs", "docs/", "/docs", "docs/leases/", "a"] {
            for name in ["lease.pdf", "x y z.pdf", "..", "ä"] {
                let key = signed_upload_key(Some(prefix), name, at()).unwrap();
                let normalized = prefix.trim_start_matches('/');
                assert!(key.starts_with(normalized), "{key} should start with {normalized}");
                assert!(is_allowed(&key, Some(normalized)));
            }
        }
    }

    #[test]
    fn test_signed_upload_key_rejects_blank_names() {
        assert!(matches!(
            signed_upload_key(None, "   ", at()),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            signed_upload_key(None, "", at()),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_direct_upload_key_splits_at_last_dot() {
        assert_eq!(
            direct_upload_key("test", "a.pdf", at()).unwrap(),
            "test/a-20250922192740.pdf"
        );
        assert_eq!(
            direct_upload_key("test", "archive.tar.gz", at()).unwrap(),
            "test/archive.tar-20250922192740.gz"
        );
        assert_eq!(
            direct_upload_key("test", "README", at()).unwrap(),
            "test/README-20250922192740"
        );
        assert_eq!(
            direct_upload_key("/uploads/", " Lease.pdf ", at()).unwrap(),
            "uploads/Lease-20250922192740.pdf"
        );
    }

    #[test]
    fn test_direct_upload_key_rejects_blank_names() {
        assert!(direct_upload_key("test", " \t", at()).is_err());
    }

    #[test]
    fn test_prefix_restriction() {
        assert!(is_allowed("anything", None));
        assert!(is_allowed("anything", Some("")));
        assert!(is_allowed("docs/a.pdf", Some("docs/")));
        assert!(!is_allowed("tmp/a.pdf", Some("docs/")));

        let paths = vec![
            "docs/a.pdf".to_string(),
            "x".to_string(),
            "docs/b.pdf".to_string(),
            "y".to_string(),
        ];
        assert_eq!(denied_paths(&paths, Some("docs/")), vec!["x", "y"]);
        assert!(denied_paths(&paths, None).is_empty());
    }
}
