//! Typed view over an OMDb response
//!
//! The cache stores responses as opaque JSON. This module pulls out the few
//! fields shown to the user: ratings, awards and a link to a movie page.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// OMDb's placeholder for a missing field
const NOT_AVAILABLE: &str = "N/A";

static WINS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s+wins?").expect("wins pattern is valid"));
static NOMINATIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s+nominations?").expect("nominations pattern is valid"));

/// Where a rating should link to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkTarget {
    #[default]
    Imdb,
    RottenTomatoes,
}

impl LinkTarget {
    /// Human-readable site name
    pub fn label(&self) -> &'static str {
        match self {
            LinkTarget::Imdb => "IMDB",
            LinkTarget::RottenTomatoes => "Rotten Tomatoes",
        }
    }

    /// Builds the link for a movie, if the needed field is present
    pub fn link_for(&self, ratings: &MovieRatings) -> Option<String> {
        match self {
            LinkTarget::Imdb => ratings
                .imdb_id
                .as_ref()
                .map(|id| format!("https://www.imdb.com/title/{}/", id)),
            LinkTarget::RottenTomatoes => ratings
                .title
                .as_deref()
                .map(|title| format!("https://www.rottentomatoes.com/m/{}", rotten_tomatoes_slug(title))),
        }
    }
}

impl FromStr for LinkTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "imdb" => Ok(LinkTarget::Imdb),
            "rottentomatoes" | "rotten-tomatoes" | "rt" => Ok(LinkTarget::RottenTomatoes),
            other => Err(format!(
                "Invalid link target: '{}'. Valid targets: imdb, rottentomatoes",
                other
            )),
        }
    }
}

impl fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkTarget::Imdb => write!(f, "imdb"),
            LinkTarget::RottenTomatoes => write!(f, "rottentomatoes"),
        }
    }
}

/// Award wins and nominations extracted from the awards text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwardsTally {
    pub wins: u64,
    pub nominations: u64,
}

impl fmt::Display for AwardsTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "🏆 {}/{}", self.wins, self.nominations)
    }
}

/// Parses texts like "Won 1 Oscar. 15 wins & 20 nominations total"
///
/// Returns `None` when neither a win nor a nomination count is found.
/// Counts too large for `u64` saturate.
pub fn parse_awards(text: &str) -> Option<AwardsTally> {
    let count = |re: &Regex| {
        re.captures(text)
            .map(|caps| caps[1].parse::<u64>().unwrap_or(u64::MAX))
            .unwrap_or(0)
    };

    let tally = AwardsTally {
        wins: count(&WINS),
        nominations: count(&NOMINATIONS),
    };

    if tally.wins == 0 && tally.nominations == 0 {
        None
    } else {
        Some(tally)
    }
}

/// Turns a title into a Rotten Tomatoes URL path segment
pub fn rotten_tomatoes_slug(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    kept.split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Display fields of a found movie
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieRatings {
    pub title: Option<String>,
    pub imdb_id: Option<String>,
    pub imdb_rating: Option<String>,
    pub imdb_votes: Option<String>,
    /// Rotten Tomatoes score, e.g. "93%"
    pub rotten_tomatoes: Option<String>,
    /// Raw awards text
    pub awards: Option<String>,
}

impl MovieRatings {
    /// Extracts ratings from a response, `None` unless it reports a found movie
    pub fn from_payload(payload: &Value) -> Option<Self> {
        if payload.get("Response").and_then(Value::as_str) != Some("True") {
            return None;
        }

        let rotten_tomatoes = payload
            .get("Ratings")
            .and_then(Value::as_array)
            .and_then(|ratings| {
                ratings
                    .iter()
                    .find(|r| r.get("Source").and_then(Value::as_str) == Some("Rotten Tomatoes"))
            })
            .and_then(|r| r.get("Value"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(Self {
            title: field(payload, "Title"),
            imdb_id: field(payload, "imdbID"),
            imdb_rating: field(payload, "imdbRating"),
            imdb_votes: field(payload, "imdbVotes"),
            rotten_tomatoes,
            awards: field(payload, "Awards"),
        })
    }

    pub fn awards_tally(&self) -> Option<AwardsTally> {
        self.awards.as_deref().and_then(parse_awards)
    }

    /// Whether there is anything worth showing
    pub fn has_ratings(&self) -> bool {
        self.imdb_rating.is_some() || self.rotten_tomatoes.is_some() || self.awards_tally().is_some()
    }

    /// One-line badge, e.g. "⭐ 8.4  🍅 93%  🏆 7/12"
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(rating) = &self.imdb_rating {
            parts.push(format!("⭐ {}", rating));
        }
        if let Some(rt) = &self.rotten_tomatoes {
            parts.push(format!("🍅 {}", rt));
        }
        if let Some(tally) = self.awards_tally() {
            parts.push(tally.to_string());
        }
        parts.join("  ")
    }

    /// Longer description with vote count and full awards text
    pub fn details(&self) -> String {
        let mut text = String::new();
        if let Some(rating) = &self.imdb_rating {
            text.push_str(&format!("IMDB Rating: {}/10", rating));
            if let Some(votes) = &self.imdb_votes {
                text.push_str(&format!(" ({} votes)", votes));
            }
        }
        if let Some(awards) = &self.awards {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(awards);
        }
        text
    }
}

/// Reads a string field, treating "N/A" and blanks as absent
fn field(payload: &Value, name: &str) -> Option<String> {
    payload
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != NOT_AVAILABLE)
        .map(str::to_string)
}
