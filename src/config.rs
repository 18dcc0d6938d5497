//! User settings and on-disk locations
//!
//! Settings live in their own namespace, separate from the movie cache: a small
//! JSON document holding the OMDb API key and the preferred link target. The
//! `OMDB_API_KEY` environment variable overrides the stored key.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::cache::{BlobStore, FileBlobStore};
use crate::data::LinkTarget;

/// Environment variable that overrides the stored API key
pub const API_KEY_ENV: &str = "OMDB_API_KEY";

/// Shortest API key accepted when saving settings
const MIN_API_KEY_LEN: usize = 8;

const SETTINGS_FILE: &str = "settings.json";
const CACHE_FILE: &str = "movie_cache.json";

/// Errors that can occur when changing settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// No API key was given
    #[error("Please enter an API key")]
    EmptyApiKey,

    /// The API key is too short to be real
    #[error("Invalid API key format")]
    InvalidApiKey,

    /// Writing the settings file failed
    #[error("Failed to save settings: {0}")]
    Io(#[from] std::io::Error),

    /// The settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persisted user preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// OMDb API key
    #[serde(default, rename = "omdbApiKey", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Which site rating links open
    #[serde(default, rename = "redirectDestination")]
    pub link_target: LinkTarget,
}

impl Settings {
    /// Reads settings, falling back to defaults if absent or unreadable
    pub fn load(store: &dyn BlobStore) -> Self {
        match store.read() {
            Ok(Some(blob)) => serde_json::from_str(&blob).unwrap_or_else(|e| {
                warn!(error = %e, "settings are corrupt, using defaults");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(error = %e, "could not read settings, using defaults");
                Self::default()
            }
        }
    }

    /// Writes settings as pretty-printed JSON
    pub fn save(&self, store: &dyn BlobStore) -> Result<(), SettingsError> {
        store.write(&serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Validates and sets the API key
    pub fn set_api_key(&mut self, key: &str) -> Result<(), SettingsError> {
        self.api_key = Some(validate_api_key(key)?);
        Ok(())
    }

    /// The key to use: a non-empty override wins over the stored key
    pub fn effective_api_key(&self, env_override: Option<String>) -> Option<String> {
        non_blank(env_override).or_else(|| self.api_key.clone())
    }

    /// Same as [`Settings::effective_api_key`] reading `OMDB_API_KEY`
    pub fn api_key_from_env(&self) -> Option<String> {
        self.effective_api_key(api_key_override())
    }
}

/// The `OMDB_API_KEY` value, if it is set and not blank
pub fn api_key_override() -> Option<String> {
    non_blank(env::var(API_KEY_ENV).ok())
}

fn non_blank(key: Option<String>) -> Option<String> {
    key.map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

/// Trims a key and rejects obviously malformed ones
pub fn validate_api_key(key: &str) -> Result<String, SettingsError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(SettingsError::EmptyApiKey);
    }
    if key.len() < MIN_API_KEY_LEN {
        return Err(SettingsError::InvalidApiKey);
    }
    Ok(key.to_string())
}

/// Where settings and the movie cache are stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub settings_file: PathBuf,
    pub cache_file: PathBuf,
}

impl DataPaths {
    /// XDG-compliant locations
    ///
    /// Uses `~/.config/cinerate/` for settings and `~/.cache/cinerate/` for the
    /// movie cache on Linux, or the platform equivalents. Returns `None` if no
    /// home directory can be determined.
    pub fn from_project_dirs() -> Option<Self> {
        let dirs = ProjectDirs::from("", "", "cinerate")?;
        Some(Self {
            settings_file: dirs.config_dir().join(SETTINGS_FILE),
            cache_file: dirs.cache_dir().join(CACHE_FILE),
        })
    }

    /// Both files inside one directory
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            settings_file: dir.join(SETTINGS_FILE),
            cache_file: dir.join(CACHE_FILE),
        }
    }

    pub fn settings_store(&self) -> FileBlobStore {
        FileBlobStore::new(self.settings_file.clone())
    }

    pub fn cache_store(&self) -> FileBlobStore {
        FileBlobStore::new(self.cache_file.clone())
    }
}
