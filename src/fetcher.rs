//! Cache-first movie lookups
//!
//! A `MovieFetcher` answers "what does the metadata API say about this title?"
//! from the cache when it can and from the network otherwise. Every completed
//! network answer is written through to the cache, including "not found", so
//! titles the API cannot resolve are not looked up again until they expire.
//! Failed lookups are never cached and can be retried on the next request.

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::cache::{cache_key, clean_title, CacheManager};
use crate::data::MetadataSource;

/// A network lookup shared by every caller asking for the same key
type PendingLookup = Shared<BoxFuture<'static, Option<Value>>>;

type InFlight = Arc<Mutex<HashMap<String, PendingLookup>>>;

/// Looks up movies through the cache
#[derive(Clone)]
pub struct MovieFetcher {
    /// Session cache consulted before the network
    cache: Arc<CacheManager>,
    /// Metadata API
    source: Arc<dyn MetadataSource>,
    /// API credential; lookups are skipped without one
    api_key: Option<String>,
    /// Network lookups currently running, by cache key
    in_flight: InFlight,
}

impl MovieFetcher {
    /// Creates a fetcher over `cache` and `source`
    pub fn new(
        cache: Arc<CacheManager>,
        source: Arc<dyn MetadataSource>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            cache,
            source,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Cache shared with every clone of this fetcher
    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    /// Whether lookups can reach the network
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Returns the metadata response for `title`, or `None` when there is none
    ///
    /// # Behavior
    /// - Without an API key, returns `None` and makes no network call
    /// - A valid cached response is returned as-is
    /// - An expired cached response is evicted before going to the network
    /// - Any API answer, found or not, is cached and persisted
    /// - Network and decoding failures return `None` and cache nothing
    /// - Concurrent lookups for the same title share one network call
    pub async fn fetch(&self, title: &str) -> Option<Value> {
        let Some(api_key) = self.api_key.clone() else {
            debug!(title, "no API key configured, skipping lookup");
            return None;
        };

        let key = cache_key(title);
        if key.is_empty() {
            return None;
        }

        if let Some(payload) = self.cache.get_fresh(&key).await {
            return Some(payload);
        }

        let pending = {
            let mut in_flight = lock(&self.in_flight);
            in_flight
                .entry(key.clone())
                .or_insert_with(|| self.start_lookup(key, clean_title(title), api_key))
                .clone()
        };

        pending.await
    }

    /// Builds the shared network lookup with write-through for one key
    fn start_lookup(&self, key: String, query: String, api_key: String) -> PendingLookup {
        let cache = self.cache.clone();
        let source = self.source.clone();
        let in_flight = self.in_flight.clone();

        async move {
            let payload = match source.lookup(&query, &api_key).await {
                Ok(payload) => {
                    if let Err(e) = cache.store(&key, payload.clone()).await {
                        warn!(key = %key, error = %e, "failed to persist movie cache");
                    }
                    Some(payload)
                }
                Err(e) => {
                    warn!(title = %query, error = %e, "movie lookup failed");
                    None
                }
            };

            lock(&in_flight).remove(&key);
            payload
        }
        .boxed()
        .shared()
    }
}

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<String, PendingLookup>> {
    in_flight
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
