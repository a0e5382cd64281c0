//! Deterministic cache key derivation.
//!
//! A key is the hex-encoded SHA-256 of `"{operation_tag}#{source_url}"` with
//! the source URL's extension appended, so an entry's address can be computed
//! without fetching the source. Identical inputs always derive the identical
//! key, which the load-or-create protocol relies on; distinct inputs get
//! distinct keys with overwhelming probability (hash-addressed, not
//! content-addressed: two URLs serving pixel-identical images still get
//! separate entries).

use std::fmt;

use sha2::{Digest, Sha256};

/// Opaque storage address derived from an operation tag and a source URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Returns the key as a path-fragment string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives the cache key for an operation applied to a source URL.
///
/// The "extension" is whatever follows the last `.` in the URL, verbatim.
/// A URL without any dot yields an empty extension and a trailing dot. The
/// extension can contain `/` (when the URL's last dot sits in its host or an
/// earlier path segment), so a key may imply subdirectories, but never a
/// dot, so a key never contains `.` or `..` path components.
///
/// # Example
///
/// ```
/// use rendercache::cache::derive_key;
///
/// let key = derive_key("fitWidth#512", "http://img.example/photo.jpg");
/// assert!(key.as_str().ends_with(".jpg"));
/// assert_eq!(key.as_str().len(), 64 + ".jpg".len());
/// ```
pub fn derive_key(operation_tag: &str, source_url: &str) -> CacheKey {
    let mut hasher = Sha256::new();
    hasher.update(operation_tag.as_bytes());
    hasher.update(b"#");
    hasher.update(source_url.as_bytes());
    let hash = hex::encode(hasher.finalize());
    CacheKey(format!("{}.{}", hash, extension_of(source_url)))
}

/// Substring of `url` after its last `.`, or empty when there is none.
fn extension_of(url: &str) -> &str {
    url.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("")
}
