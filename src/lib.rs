//! cinerate library
//!
//! Movie rating lookups against the OMDb API with a local, expiring,
//! write-through cache. The binary in `main.rs` is a thin command line over
//! [`app::App`].

pub mod app;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod data;
pub mod fetcher;
pub mod logging;
