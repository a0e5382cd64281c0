//! On-disk blob store for rendered images.
//!
//! Entries live under a configured root directory, addressed by cache key.
//! The store is deliberately simple:
//!
//! - **No in-memory layer**: every load re-reads and re-decodes from disk.
//! - **No metadata sidecar**: an entry's format is re-sniffed from its bytes.
//! - **Atomic visibility**: writes go to a temp file first and are renamed
//!   into place, so `exists` never observes a partially written entry.
//!
//! Keys are usually flat file names (`{hash}.{ext}`), but a source URL whose
//! last dot is followed by `/` yields an extension with path segments; the
//! store creates those intermediate directories. Key extensions can never
//! contain a dot, so a key never carries `.`/`..` components and always
//! resolves inside the root.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cache::CacheKey;
use crate::error::StorageError;
use crate::image::{decode_image, sniff_format, ImageData, Rotation};

/// Filesystem-backed store of encoded cache entries.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Create a store rooted at `root`. The directory is not touched until
    /// [`ensure_root`](Self::ensure_root) or the first store.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The configured storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the storage root if missing. Called once at startup.
    pub async fn ensure_root(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::Write {
                path: self.root.display().to_string(),
                message: e.to_string(),
            })?;

        info!(path = %self.root.display(), "storage root ready");
        Ok(())
    }

    /// Resolves a key to its path under the root.
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    /// True iff an entry is present at `key`. Pure path probe: nothing is
    /// read or decoded.
    pub async fn exists(&self, key: &CacheKey) -> bool {
        tokio::fs::try_exists(self.entry_path(key))
            .await
            .unwrap_or(false)
    }

    /// Reads and decodes the entry at `key`.
    ///
    /// The format is re-sniffed from the stored bytes. Rotation is always
    /// reported as 0: persisted rasters are already upright, and orientation
    /// metadata is never re-derived from an entry.
    pub async fn load(&self, key: &CacheKey) -> Result<ImageData, StorageError> {
        let path = self.entry_path(key);

        let bytes = tokio::fs::read(&path).await.map_err(|e| StorageError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let format = sniff_format(&bytes).map_err(|e| StorageError::Corrupt {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let raster = decode_image(&bytes, format).map_err(|e| StorageError::Corrupt {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(ImageData {
            image: raster,
            format,
            rotation: Rotation::Deg0,
        })
    }

    /// Encodes `data` with its declared format and writes it at `key`,
    /// creating any intermediate directories the key implies.
    ///
    /// The encoded bytes land in a `.tmp` sibling first and are renamed into
    /// place, so a crash or write failure never leaves a partial entry
    /// visible. Re-storing an existing key overwrites it (last writer wins).
    pub async fn store(&self, key: &CacheKey, data: &ImageData) -> Result<(), StorageError> {
        let path = self.entry_path(key);

        let bytes = data.encode().map_err(|e| StorageError::Encode {
            format: data.mime_type().to_string(),
            message: e.to_string(),
        })?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Write {
                    path: parent.display().to_string(),
                    message: e.to_string(),
                })?;
        }

        let tmp = tmp_path(&path);
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StorageError::Write {
                path: tmp.display().to_string(),
                message: e.to_string(),
            })?;

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::Write {
                path: path.display().to_string(),
                message: e.to_string(),
            });
        }

        debug!(key = %key, bytes = bytes.len(), "stored cache entry");
        Ok(())
    }
}

/// Sibling path the entry is staged at before the rename.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
