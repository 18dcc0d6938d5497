//! Whole-value persistence for the cache and settings namespaces
//!
//! Each namespace is a single serialized blob. Reads and writes always move
//! the entire value; there is no partial or per-key access.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// A persisted slot holding one serialized value
pub trait BlobStore: Send + Sync {
    /// Reads the stored blob, `Ok(None)` if nothing has been written yet
    fn read(&self) -> io::Result<Option<String>>;

    /// Replaces the stored blob
    fn write(&self, blob: &str) -> io::Result<()>;
}

/// Stores a blob as a file on disk
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    path: PathBuf,
}

impl FileBlobStore {
    /// Creates a store backed by the file at `path`
    ///
    /// The file and its parent directories are created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BlobStore for FileBlobStore {
    fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, blob: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, blob)
    }
}

/// Keeps a blob in memory
///
/// Useful for tests and for embedding the cache without touching disk. Writes
/// can be made to fail to simulate an unavailable backing store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blob: Mutex<Option<String>>,
    fail_writes: Mutex<bool>,
    writes: Mutex<usize>,
}

impl MemoryBlobStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `blob`
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
            ..Self::default()
        }
    }

    /// Returns a copy of the current blob
    pub fn contents(&self) -> Option<String> {
        lock(&self.blob).clone()
    }

    /// Makes subsequent writes fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        *lock(&self.fail_writes) = fail;
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        *lock(&self.writes)
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self) -> io::Result<Option<String>> {
        Ok(lock(&self.blob).clone())
    }

    fn write(&self, blob: &str) -> io::Result<()> {
        if *lock(&self.fail_writes) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "memory store is read-only",
            ));
        }
        *lock(&self.blob) = Some(blob.to_string());
        *lock(&self.writes) += 1;
        Ok(())
    }
}

/// Locks a mutex, recovering the value if a previous holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
