//! Cache manager for a lookup session
//!
//! Provides a `CacheManager` that holds the loaded movie cache in memory and
//! writes it through to a `BlobStore` after every mutation. All mutations go
//! through one lock, so concurrent write-throughs for different titles cannot
//! overwrite each other's updates. Writes run on the blocking thread pool.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::stats::{stats, CacheStats};
use super::storage::BlobStore;
use super::store::{MovieCache, StorageError, CACHE_TTL_MS};
use super::sweep::sweep;
use crate::clock::Clock;

/// Owns the in-memory cache and its persistence for one session
pub struct CacheManager {
    /// Loaded cache; the lock is held across save so writes are serialized
    cache: Mutex<MovieCache>,
    /// Where the cache blob is persisted
    storage: Arc<dyn BlobStore>,
    /// Source of entry timestamps
    clock: Arc<dyn Clock>,
    /// Entry lifetime in milliseconds
    ttl_ms: i64,
}

impl CacheManager {
    /// Loads the persisted cache and sweeps expired entries
    ///
    /// Uses the standard 7-day TTL. If the sweep removed anything, the result
    /// is saved; a failed save is logged and the session carries on with the
    /// swept in-memory cache.
    pub fn open(storage: Arc<dyn BlobStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(storage, clock, CACHE_TTL_MS)
    }

    /// Same as [`CacheManager::open`] with a custom TTL
    pub fn with_ttl(storage: Arc<dyn BlobStore>, clock: Arc<dyn Clock>, ttl_ms: i64) -> Self {
        let mut cache = MovieCache::load(storage.as_ref());
        let removed = sweep(&mut cache, clock.now_millis(), ttl_ms);

        if removed > 0 {
            info!(removed, "swept expired movie cache entries");
            if let Err(e) = cache.save(storage.as_ref()) {
                warn!(error = %e, "failed to persist swept movie cache");
            }
        }

        Self {
            cache: Mutex::new(cache),
            storage,
            clock,
            ttl_ms,
        }
    }

    /// Returns the cached payload for `key` if it is still valid
    ///
    /// An expired entry is dropped from memory on the spot so a fresh payload
    /// can never be mixed with a stale one under the same key.
    pub async fn get_fresh(&self, key: &str) -> Option<Value> {
        let now = self.clock.now_millis();
        let mut cache = self.cache.lock().await;

        let entry = cache.get(key)?;
        if entry.is_valid(now, self.ttl_ms) {
            debug!(key, "movie cache hit");
            return Some(entry.data.clone());
        }

        debug!(key, "movie cache entry expired");
        cache.remove(key);
        None
    }

    /// Stores `payload` under `key` and persists the whole cache
    ///
    /// On a persistence failure the in-memory entry is kept, so it still
    /// serves the rest of this session.
    pub async fn store(&self, key: &str, payload: Value) -> Result<(), StorageError> {
        let now = self.clock.now_millis();
        let mut cache = self.cache.lock().await;
        cache.put(key, payload, now);
        let blob = cache.to_json()?;
        self.persist(blob).await
    }

    /// Empties the cache in memory and in storage
    pub async fn clear(&self) -> Result<(), StorageError> {
        let mut cache = self.cache.lock().await;
        *cache = MovieCache::new();
        self.persist(cache.to_json()?).await?;
        info!("movie cache cleared");
        Ok(())
    }

    /// Writes `blob` off the async workers; callers hold the cache lock
    async fn persist(&self, blob: String) -> Result<(), StorageError> {
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || storage.write(&blob)).await??;
        Ok(())
    }

    /// Counts entries as of now
    pub async fn stats(&self) -> CacheStats {
        let now = self.clock.now_millis();
        let cache = self.cache.lock().await;
        stats(&cache, now, self.ttl_ms)
    }

    /// Returns a copy of the in-memory cache
    pub async fn snapshot(&self) -> MovieCache {
        self.cache.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::storage::{FileBlobStore, MemoryBlobStore};
    use crate::clock::ManualClock;
    use serde_json::json;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    const START: i64 = 1_700_000_000_000;

    fn create_test_manager() -> (CacheManager, Arc<MemoryBlobStore>, Arc<ManualClock>) {
        let storage = Arc::new(MemoryBlobStore::new());
        let clock = Arc::new(ManualClock::new(START));
        let manager = CacheManager::open(storage.clone(), clock.clone());
        (manager, storage, clock)
    }

    #[tokio::test]
    async fn test_store_then_get_fresh_returns_payload() {
        let (manager, storage, _clock) = create_test_manager();
        let payload = json!({"Response": "True", "Title": "Dune"});

        manager.store("dune", payload.clone()).await.unwrap();

        assert_eq!(manager.get_fresh("dune").await, Some(payload));
        assert_eq!(storage.write_count(), 1);
    }

    #[tokio::test]
    async fn test_get_fresh_missing_key() {
        let (manager, _storage, _clock) = create_test_manager();
        assert!(manager.get_fresh("nothing").await.is_none());
    }

    #[tokio::test]
    async fn test_get_fresh_evicts_expired_entry() {
        let (manager, _storage, clock) = create_test_manager();
        manager.store("old", json!({"Response": "True"})).await.unwrap();

        clock.advance(CACHE_TTL_MS);

        assert!(manager.get_fresh("old").await.is_none());
        assert!(manager.snapshot().await.get("old").is_none());
    }

    #[tokio::test]
    async fn test_open_sweeps_and_persists_when_entries_removed() {
        let mut seeded = MovieCache::new();
        seeded.put("fresh", json!({"Response": "True"}), START - 1_000);
        seeded.put("stale", json!({"Response": "True"}), START - CACHE_TTL_MS - 1);
        let storage = Arc::new(MemoryBlobStore::with_blob(seeded.to_json().unwrap()));

        let manager = CacheManager::open(storage.clone(), Arc::new(ManualClock::new(START)));

        assert_eq!(manager.stats().await.total, 1);
        assert_eq!(storage.write_count(), 1);
        let persisted = MovieCache::load(storage.as_ref());
        assert!(persisted.get("stale").is_none());
        assert!(persisted.get("fresh").is_some());
    }

    #[tokio::test]
    async fn test_open_does_not_write_when_nothing_expired() {
        let mut seeded = MovieCache::new();
        seeded.put("fresh", json!({}), START);
        let storage = Arc::new(MemoryBlobStore::with_blob(seeded.to_json().unwrap()));

        let _manager = CacheManager::open(storage.clone(), Arc::new(ManualClock::new(START)));

        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test]
    async fn test_open_survives_corrupt_blob() {
        let storage = Arc::new(MemoryBlobStore::with_blob("]]garbage"));
        let manager = CacheManager::open(storage, Arc::new(ManualClock::new(START)));

        assert_eq!(manager.stats().await.total, 0);
    }

    #[tokio::test]
    async fn test_store_failure_keeps_entry_in_memory() {
        let (manager, storage, _clock) = create_test_manager();
        storage.set_fail_writes(true);

        let result = manager.store("dune", json!({"Response": "True"})).await;

        assert!(result.is_err());
        assert!(manager.get_fresh("dune").await.is_some());
        assert!(storage.contents().is_none());
    }

    #[tokio::test]
    async fn test_clear_empties_memory_and_storage() {
        let (manager, storage, _clock) = create_test_manager();
        manager.store("a", json!({})).await.unwrap();
        manager.store("b", json!({})).await.unwrap();

        manager.clear().await.unwrap();

        let stats = manager.stats().await;
        assert_eq!((stats.total, stats.valid, stats.expired), (0, 0, 0));
        assert_eq!(storage.contents().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_stats_reflect_clock() {
        let (manager, _storage, clock) = create_test_manager();
        manager.store("a", json!({})).await.unwrap();
        clock.advance(CACHE_TTL_MS / 2);
        manager.store("b", json!({})).await.unwrap();
        clock.advance(CACHE_TTL_MS / 2);

        let stats = manager.stats().await;

        assert_eq!(stats.total, 2);
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.expired, 1);
    }

    #[tokio::test]
    async fn test_concurrent_stores_for_distinct_keys_all_persist() {
        let (manager, storage, _clock) = create_test_manager();
        let manager = Arc::new(manager);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let manager = manager.clone();
                tokio::spawn(async move {
                    manager
                        .store(&format!("movie-{}", i), json!({"n": i}))
                        .await
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let persisted = MovieCache::load(storage.as_ref());
        assert_eq!(persisted.len(), 16);
    }

    /// Blocks the calling thread on every write, like a slow disk
    struct SlowBlobStore {
        ticked: Arc<AtomicBool>,
        saw_tick: AtomicBool,
    }

    impl BlobStore for SlowBlobStore {
        fn read(&self) -> io::Result<Option<String>> {
            Ok(None)
        }

        fn write(&self, _blob: &str) -> io::Result<()> {
            std::thread::sleep(Duration::from_millis(200));
            self.saw_tick
                .store(self.ticked.load(Ordering::SeqCst), Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_slow_write_does_not_stall_other_tasks() {
        let ticked = Arc::new(AtomicBool::new(false));
        let storage = Arc::new(SlowBlobStore {
            ticked: ticked.clone(),
            saw_tick: AtomicBool::new(false),
        });
        let manager = CacheManager::open(storage.clone(), Arc::new(ManualClock::new(START)));

        let (result, _) = tokio::join!(manager.store("dune", json!({})), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            ticked.store(true, Ordering::SeqCst);
        });

        result.unwrap();
        assert!(storage.saw_tick.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cache_survives_reopen_from_disk() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage = Arc::new(FileBlobStore::new(temp_dir.path().join("movie_cache.json")));
        let clock = Arc::new(ManualClock::new(START));

        let manager = CacheManager::open(storage.clone(), clock.clone());
        manager
            .store("past lives", json!({"Response": "True"}))
            .await
            .unwrap();
        drop(manager);

        let reopened = CacheManager::open(storage, clock);
        assert!(reopened.get_fresh("past lives").await.is_some());
    }
}
