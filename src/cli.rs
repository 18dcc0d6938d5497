//! Command-line interface parsing for cinerate
//!
//! This module handles parsing of CLI arguments using clap: the lookup, cache
//! and settings subcommands, and the optional data directory override.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use crate::config::DataPaths;
use crate::data::LinkTarget;

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified link target is not recognized
    #[error("Invalid link target: '{0}'. Valid targets: imdb, rottentomatoes")]
    InvalidLinkTarget(String),

    /// No place to keep settings and cache could be found
    #[error("Could not determine a data directory; pass --data-dir")]
    NoDataDir,
}

/// cinerate - Movie ratings from OMDb with a local 7-day cache
#[derive(Parser, Debug)]
#[command(name = "cinerate")]
#[command(about = "Look up movie ratings with a local expiring cache")]
#[command(version)]
pub struct Cli {
    /// Keep settings and cache in this directory instead of the XDG locations
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Look up ratings for one or more titles
    ///
    /// Examples:
    ///   cinerate lookup "Oppenheimer (2023)"
    ///   cinerate lookup Dune Barbie --json
    Lookup {
        /// Movie titles; a trailing "(YYYY)" is ignored
        #[arg(required = true, value_name = "TITLE")]
        titles: Vec<String>,

        /// Print raw API responses as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove every cached lookup
    Clear,

    /// Show cache statistics
    Stats {
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// View or change settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Print current settings
    Show,

    /// Save the OMDb API key
    SetKey {
        /// API key from omdbapi.com
        key: String,
    },

    /// Choose where rating links point: imdb or rottentomatoes
    Link {
        #[arg(value_name = "TARGET")]
        target: String,
    },
}

/// Parses a link target argument
///
/// # Returns
/// * `Ok(LinkTarget)` if the string names a known site
/// * `Err(CliError::InvalidLinkTarget)` if it doesn't
pub fn parse_link_target_arg(s: &str) -> Result<LinkTarget, CliError> {
    s.parse::<LinkTarget>()
        .map_err(|_| CliError::InvalidLinkTarget(s.to_string()))
}

impl Cli {
    /// Resolves where settings and cache are stored
    pub fn data_paths(&self) -> Result<DataPaths, CliError> {
        match &self.data_dir {
            Some(dir) => Ok(DataPaths::in_dir(dir)),
            None => DataPaths::from_project_dirs().ok_or(CliError::NoDataDir),
        }
    }
}
