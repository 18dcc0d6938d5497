//! Cache module for storing movie metadata lookups
//!
//! The cache maps a normalized title to the raw metadata response and the time
//! it was fetched. It is loaded once per session, swept of expired entries,
//! and written back whole after every change. Entries live for 7 days.

mod key;
mod manager;
mod stats;
mod storage;
mod store;
mod sweep;

pub use key::{cache_key, clean_title};
pub use manager::CacheManager;
pub use stats::{stats, CacheStats};
pub use storage::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use store::{CacheEntry, MovieCache, StorageError, CACHE_TTL_MS};
pub use sweep::sweep;
