//! Expiry sweep over the in-memory cache

use super::store::MovieCache;

/// Removes every entry whose age is at least `ttl_ms`
///
/// Returns the number of entries removed. The caller decides whether to
/// persist the result; nothing needs saving when this returns 0.
pub fn sweep(cache: &mut MovieCache, now: i64, ttl_ms: i64) -> usize {
    let before = cache.len();
    cache.retain(|entry| entry.is_valid(now, ttl_ms));
    before - cache.len()
}
