//! In-memory movie cache and its persisted form
//!
//! The whole cache is persisted as one JSON object keyed by normalized title:
//! `{ "<key>": { "data": <payload>, "timestamp": <epoch ms> } }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

use super::storage::BlobStore;

/// How long a cached lookup stays valid: 7 days in milliseconds
pub const CACHE_TTL_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Errors that can occur when persisting the cache
#[derive(Debug, Error)]
pub enum StorageError {
    /// Writing the blob failed
    #[error("Failed to write cache: {0}")]
    Io(#[from] std::io::Error),

    /// The cache could not be serialized
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The background write did not complete
    #[error("Cache write task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A single cached metadata response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The raw API response, found or not found
    pub data: Value,
    /// When the entry was written, in epoch milliseconds
    pub timestamp: i64,
}

impl CacheEntry {
    /// Age of the entry at `now`, saturating on out-of-range timestamps
    pub fn age(&self, now: i64) -> i64 {
        now.saturating_sub(self.timestamp)
    }

    /// Whether the entry is still usable at `now`
    pub fn is_valid(&self, now: i64, ttl_ms: i64) -> bool {
        self.age(now) < ttl_ms
    }
}

/// Mapping from cache key to entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieCache {
    entries: BTreeMap<String, CacheEntry>,
}

impl MovieCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the persisted cache
    ///
    /// Never fails: a missing, unreadable or corrupt blob yields an empty cache.
    pub fn load(storage: &dyn BlobStore) -> Self {
        let blob = match storage.read() {
            Ok(Some(blob)) => blob,
            Ok(None) => return Self::new(),
            Err(e) => {
                warn!(error = %e, "could not read movie cache, starting empty");
                return Self::new();
            }
        };

        match serde_json::from_str(&blob) {
            Ok(cache) => cache,
            Err(e) => {
                warn!(error = %e, "movie cache is corrupt, starting empty");
                Self::new()
            }
        }
    }

    /// Writes the entire cache, replacing whatever was persisted before
    pub fn save(&self, storage: &dyn BlobStore) -> Result<(), StorageError> {
        storage.write(&self.to_json()?)?;
        Ok(())
    }

    /// Replaces the persisted cache with an empty mapping
    pub fn clear(storage: &dyn BlobStore) -> Result<(), StorageError> {
        Self::new().save(storage)
    }

    /// Compact JSON form of the cache, as persisted
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Entry for `key`, valid or not
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Inserts or overwrites the entry for `key`
    pub fn put(&mut self, key: impl Into<String>, data: Value, now: i64) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                data,
                timestamp: now,
            },
        );
    }

    /// Drops the entry for `key` in memory only
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    /// Number of entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.entries.iter()
    }

    /// Keeps only the entries for which `keep` returns true
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&CacheEntry) -> bool) {
        self.entries.retain(|_, entry| keep(entry));
    }
}
