//! Title normalization for cache keys and API queries

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a trailing release-year annotation such as " (2023)"
static YEAR_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(\d{4}\)\s*$").expect("year suffix pattern is valid"));

/// Strips a trailing `(YYYY)` annotation and surrounding whitespace
///
/// This is the form sent to the metadata API, so case is preserved.
pub fn clean_title(title: &str) -> String {
    YEAR_SUFFIX.replace(title.trim(), "").trim().to_string()
}

/// Produces the cache key for a title: the cleaned title, lowercased
///
/// # Examples
/// ```
/// use cinerate::cache::cache_key;
///
/// assert_eq!(cache_key("Oppenheimer (2023)"), "oppenheimer");
/// assert_eq!(cache_key("  oppenheimer "), "oppenheimer");
/// ```
pub fn cache_key(title: &str) -> String {
    clean_title(title).to_lowercase()
}
