//! Application wiring for cinerate
//!
//! This module builds the cache session, the OMDb client and the fetcher from
//! the user's settings, and exposes the three operations the command line
//! offers: look up titles, clear the cache, and report cache statistics.

use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;

use crate::cache::{
    stats, BlobStore, CacheManager, CacheStats, MovieCache, StorageError, CACHE_TTL_MS,
};
use crate::clock::{Clock, SystemClock};
use crate::config::{DataPaths, Settings};
use crate::data::{LinkTarget, MetadataSource, MovieRatings, OmdbClient};
use crate::fetcher::MovieFetcher;

/// Result of looking up one title
#[derive(Debug, Clone, PartialEq)]
pub struct LookupOutcome {
    /// Title as given by the caller
    pub title: String,
    /// Raw API response, `None` if no lookup could be made
    pub payload: Option<Value>,
}

impl LookupOutcome {
    /// Display fields, if the API found the movie
    pub fn ratings(&self) -> Option<MovieRatings> {
        self.payload.as_ref().and_then(MovieRatings::from_payload)
    }

    /// Human-readable lines for this outcome
    pub fn describe(&self, link_target: LinkTarget) -> String {
        let Some(payload) = &self.payload else {
            return format!("{}: no rating", self.title);
        };
        let Some(ratings) = MovieRatings::from_payload(payload) else {
            return format!("{}: not found", self.title);
        };
        if !ratings.has_ratings() {
            return format!("{}: no ratings available", self.title);
        }

        let mut text = format!("{}: {}", self.title, ratings.summary());
        let details = ratings.details();
        if !details.is_empty() {
            for line in details.lines() {
                text.push_str(&format!("\n  {}", line));
            }
        }
        if let Some(link) = link_target.link_for(&ratings) {
            text.push_str(&format!("\n  View on {}: {}", link_target.label(), link));
        }
        text
    }
}

/// Main application struct holding the session
pub struct App {
    /// Settings in effect for this session
    settings: Settings,
    /// Cache-first lookups
    fetcher: MovieFetcher,
}

impl App {
    /// Opens a session on disk using the public OMDb API
    ///
    /// The stored API key is overridden by `OMDB_API_KEY` when set.
    pub fn open(paths: &DataPaths) -> Self {
        let settings = Settings::load(&paths.settings_store());
        let api_key = settings.api_key_from_env();
        Self::with_parts(
            settings,
            api_key,
            Arc::new(paths.cache_store()),
            Arc::new(SystemClock),
            Arc::new(OmdbClient::new()),
        )
    }

    /// Creates an App from explicit collaborators
    pub fn with_parts(
        settings: Settings,
        api_key: Option<String>,
        cache_store: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        source: Arc<dyn MetadataSource>,
    ) -> Self {
        let cache = Arc::new(CacheManager::open(cache_store, clock));
        Self {
            settings,
            fetcher: MovieFetcher::new(cache, source, api_key),
        }
    }

    /// Settings this session was opened with
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether lookups can reach the API
    pub fn has_api_key(&self) -> bool {
        self.fetcher.has_api_key()
    }

    /// Looks up one title
    pub async fn lookup(&self, title: &str) -> LookupOutcome {
        LookupOutcome {
            title: title.to_string(),
            payload: self.fetcher.fetch(title).await,
        }
    }

    /// Looks up all titles concurrently, preserving input order
    pub async fn lookup_many(&self, titles: &[String]) -> Vec<LookupOutcome> {
        join_all(titles.iter().map(|title| self.lookup(title))).await
    }

    /// Empties the movie cache
    pub async fn clear_cache(&self) -> Result<(), StorageError> {
        self.fetcher.cache().clear().await
    }

    /// Counts the session's in-memory cache
    pub async fn cache_stats(&self) -> CacheStats {
        self.fetcher.cache().stats().await
    }
}

/// Counts the persisted cache as it is, expired entries included
///
/// Nothing is swept or written, so this never changes the stored cache.
pub fn stored_cache_stats(store: &dyn BlobStore, clock: &dyn Clock) -> CacheStats {
    let cache = MovieCache::load(store);
    stats(&cache, clock.now_millis(), CACHE_TTL_MS)
}
