//! Aggregate counts over the movie cache

use serde::Serialize;

use super::store::MovieCache;

/// Snapshot of cache contents for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of entries, valid or not
    pub total: usize,
    /// Entries younger than the TTL
    pub valid: usize,
    /// Entries at or past the TTL
    pub expired: usize,
    /// Byte length of the serialized cache
    pub size_bytes: usize,
}

impl CacheStats {
    /// Size in kilobytes, formatted with two decimals
    pub fn size_kb(&self) -> String {
        format!("{:.2}", self.size_bytes as f64 / 1024.0)
    }
}

/// Computes stats for `cache` as of `now`
pub fn stats(cache: &MovieCache, now: i64, ttl_ms: i64) -> CacheStats {
    let total = cache.len();
    let valid = cache
        .iter()
        .filter(|(_, entry)| entry.is_valid(now, ttl_ms))
        .count();
    let size_bytes = cache.to_json().map(|json| json.len()).unwrap_or(0);

    CacheStats {
        total,
        valid,
        expired: total - valid,
        size_bytes,
    }
}
