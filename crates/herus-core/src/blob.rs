//! # Blob Area
//!
//! Uploaded bytes live outside the engine, one file per media hash. The
//! graph only stores the hash; whoever needs the content asks a
//! `BlobStore` for it.
//!
//! Two implementations:
//! - `FsBlobStore`: a flat directory, file name = hex hash
//! - `MemoryBlobStore`: a map behind a mutex, for tests and tooling

use crate::{HerusError, MediaHash};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Content-addressed byte storage keyed by `MediaHash`.
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `hash`. Writing an existing hash again is
    /// harmless: the content is identical by construction.
    fn write_blob(&self, hash: &MediaHash, bytes: &[u8]) -> Result<(), HerusError>;

    /// Fetch the bytes stored under `hash`, if any.
    fn read_blob(&self, hash: &MediaHash) -> Result<Option<Vec<u8>>, HerusError>;

    /// Whether anything is stored under `hash`.
    fn contains(&self, hash: &MediaHash) -> Result<bool, HerusError>;
}

impl<B: BlobStore + ?Sized> BlobStore for Arc<B> {
    fn write_blob(&self, hash: &MediaHash, bytes: &[u8]) -> Result<(), HerusError> {
        (**self).write_blob(hash, bytes)
    }

    fn read_blob(&self, hash: &MediaHash) -> Result<Option<Vec<u8>>, HerusError> {
        (**self).read_blob(hash)
    }

    fn contains(&self, hash: &MediaHash) -> Result<bool, HerusError> {
        (**self).contains(hash)
    }
}

// =============================================================================
// FILESYSTEM
// =============================================================================

/// Blob area on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Use `root` as the blob directory, creating it if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, HerusError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            HerusError::Blob(format!("cannot create {}: {}", root.display(), e))
        })?;
        info!(path = %root.display(), "initialized blob area");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, hash: &MediaHash) -> PathBuf {
        self.root.join(hash.as_str())
    }
}

impl BlobStore for FsBlobStore {
    fn write_blob(&self, hash: &MediaHash, bytes: &[u8]) -> Result<(), HerusError> {
        let path = self.blob_path(hash);
        // Readers must never observe a half-written file, so write beside
        // the target and rename over it.
        let tmp = self.root.join(format!(".{}.tmp", hash.as_str()));

        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };
        write().map_err(|e| {
            let _ = fs::remove_file(&tmp);
            HerusError::Blob(format!("cannot write {}: {}", path.display(), e))
        })?;

        info!(hash = %hash, size = bytes.len(), "stored blob");
        Ok(())
    }

    fn read_blob(&self, hash: &MediaHash) -> Result<Option<Vec<u8>>, HerusError> {
        let path = self.blob_path(hash);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(hash = %hash, "blob not found");
                Ok(None)
            }
            Err(e) => Err(HerusError::Blob(format!(
                "cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn contains(&self, hash: &MediaHash) -> Result<bool, HerusError> {
        self.blob_path(hash)
            .try_exists()
            .map_err(|e| HerusError::Blob(e.to_string()))
    }
}

// =============================================================================
// MEMORY
// =============================================================================

/// Blob area held in memory. Counts writes so callers can check how often
/// content actually reached the blob area.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<MediaHash, Vec<u8>>>,
    writes: Mutex<u64>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `write_blob` calls so far.
    pub fn write_count(&self) -> u64 {
        self.writes.lock().map(|n| *n).unwrap_or_default()
    }

    fn poisoned() -> HerusError {
        HerusError::Blob("memory blob store lock poisoned".to_string())
    }
}

impl BlobStore for MemoryBlobStore {
    fn write_blob(&self, hash: &MediaHash, bytes: &[u8]) -> Result<(), HerusError> {
        let mut blobs = self.blobs.lock().map_err(|_| Self::poisoned())?;
        blobs.insert(hash.clone(), bytes.to_vec());
        let mut writes = self.writes.lock().map_err(|_| Self::poisoned())?;
        *writes += 1;
        Ok(())
    }

    fn read_blob(&self, hash: &MediaHash) -> Result<Option<Vec<u8>>, HerusError> {
        let blobs = self.blobs.lock().map_err(|_| Self::poisoned())?;
        Ok(blobs.get(hash).cloned())
    }

    fn contains(&self, hash: &MediaHash) -> Result<bool, HerusError> {
        let blobs = self.blobs.lock().map_err(|_| Self::poisoned())?;
        Ok(blobs.contains_key(hash))
    }
}

// =============================================================================
// TESTS
// =============================================================================
