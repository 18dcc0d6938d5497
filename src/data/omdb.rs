//! OMDb API client
//!
//! This module looks up a movie by exact title against the OMDb API and returns
//! the response body untouched. Both found and not-found answers are successful
//! lookups; only transport, status and decoding problems are errors.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

/// Base URL for the OMDb API
const OMDB_BASE_URL: &str = "https://www.omdbapi.com/";

/// Errors that can occur when looking up a title
#[derive(Debug, Error)]
pub enum LookupError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API returned status {0}")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse API response: {0}")]
    Parse(String),
}

/// A metadata service that can look up a movie by title
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Looks up `title` using `api_key`
    ///
    /// # Returns
    /// * `Ok(Value)` - The raw response, which may report the title as not found
    /// * `Err(LookupError)` - If the lookup could not be completed
    async fn lookup(&self, title: &str, api_key: &str) -> Result<Value, LookupError>;
}

/// Client for the OMDb API
#[derive(Debug, Clone)]
pub struct OmdbClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Base URL for the API (allows override for testing)
    base_url: String,
}

impl Default for OmdbClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OmdbClient {
    /// Creates a new OmdbClient pointing at the public API
    pub fn new() -> Self {
        Self::with_base_url(OMDB_BASE_URL)
    }

    /// Creates a new OmdbClient with a custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Endpoint every lookup is sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl MetadataSource for OmdbClient {
    async fn lookup(&self, title: &str, api_key: &str) -> Result<Value, LookupError> {
        info!(title, "fetching movie from OMDb");

        let response = self
            .http_client
            .get(self.base_url())
            .query(&[("apikey", api_key), ("t", title)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        parse_body(&text)
    }
}

/// Decodes a response body, requiring an object with a `Response` field
fn parse_body(text: &str) -> Result<Value, LookupError> {
    let value: Value = serde_json::from_str(text).map_err(|e| LookupError::Parse(e.to_string()))?;

    match value.get("Response") {
        Some(Value::String(_)) => Ok(value),
        _ => Err(LookupError::Parse(
            "missing \"Response\" field".to_string(),
        )),
    }
}
