//! cinerate - Movie ratings from OMDb with a local expiring cache
//!
//! Looks up IMDb and Rotten Tomatoes ratings for movie titles, keeping every
//! answer in a 7-day cache so repeated lookups never hit the network.

use clap::Parser;
use serde_json::{json, Value};

use cinerate::app::{stored_cache_stats, App};
use cinerate::cache::MovieCache;
use cinerate::cli::{parse_link_target_arg, Cli, Command, ConfigCommand};
use cinerate::clock::SystemClock;
use cinerate::config::{api_key_override, DataPaths, Settings, API_KEY_ENV};
use cinerate::logging::init_logger;

/// Looks up titles and prints one block per title
async fn run_lookup(
    app: &App,
    titles: &[String],
    as_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !app.has_api_key() {
        eprintln!(
            "No OMDb API key configured. Run `cinerate config set-key <KEY>` or set {}.",
            API_KEY_ENV
        );
    }

    let outcomes = app.lookup_many(titles).await;

    if as_json {
        let results: Vec<Value> = outcomes
            .iter()
            .map(|o| json!({ "title": o.title, "data": o.payload }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        let link_target = app.settings().link_target;
        for outcome in &outcomes {
            println!("{}", outcome.describe(link_target));
        }
    }

    Ok(())
}

/// Prints statistics for the stored cache
fn run_stats(paths: &DataPaths, as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let stats = stored_cache_stats(&paths.cache_store(), &SystemClock);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Total entries:   {}", stats.total);
        println!("Valid entries:   {}", stats.valid);
        println!("Expired entries: {}", stats.expired);
        println!("Cache size:      {} KB ({} bytes)", stats.size_kb(), stats.size_bytes);
    }

    Ok(())
}

/// Shows or updates settings
fn run_config(paths: &DataPaths, command: ConfigCommand) -> Result<(), Box<dyn std::error::Error>> {
    let store = paths.settings_store();
    let mut settings = Settings::load(&store);

    match command {
        ConfigCommand::Show => {
            let key_status = match (&settings.api_key, api_key_override().is_some()) {
                (_, true) => format!("set (from {})", API_KEY_ENV),
                (Some(_), false) => "set".to_string(),
                (None, false) => "not set".to_string(),
            };
            println!("API key:     {}", key_status);
            println!("Link target: {}", settings.link_target);
            println!("Settings:    {}", paths.settings_file.display());
            println!("Cache:       {}", paths.cache_file.display());
        }
        ConfigCommand::SetKey { key } => {
            settings.set_api_key(&key)?;
            settings.save(&store)?;
            println!("Settings saved successfully!");
        }
        ConfigCommand::Link { target } => {
            settings.link_target = parse_link_target_arg(&target)?;
            settings.save(&store)?;
            println!("Rating links now open {}", settings.link_target.label());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();

    let cli = Cli::parse();
    let paths = cli.data_paths()?;

    match cli.command {
        Command::Lookup { titles, json } => {
            let app = App::open(&paths);
            run_lookup(&app, &titles, json).await?;
        }
        Command::Clear => {
            MovieCache::clear(&paths.cache_store())?;
            println!("Cache cleared successfully!");
        }
        Command::Stats { json } => run_stats(&paths, json)?,
        Command::Config(command) => run_config(&paths, command)?,
    }

    Ok(())
}
