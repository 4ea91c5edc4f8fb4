//! Subcommand implementations.

pub mod download;
pub mod list;
pub mod search;
pub mod upload;

use anyhow::{Context, Result};
use chrono::Local;

use nexus_cache::SearchCache;
use nexus_core::SearchResult;

use crate::cli::{Cli, Commands};
use crate::config::Settings;
use crate::output;

pub async fn handle(cli: Cli) -> Result<()> {
    let settings = Settings::resolve(cli.global)?;

    match cli.command {
        Commands::Search(args) => search::run(&settings, args).await,
        Commands::List(args) => list::run(&settings, args).await,
        Commands::Download(args) => download::run(&settings, args).await,
        Commands::Upload(args) => upload::run(&settings, args).await,
    }
}

/// Warn when a cached result was taken on an earlier day.
fn warn_if_stale(result: &SearchResult) {
    if SearchCache::is_stale(result, &Local::now()) {
        let taken = result.timestamp.with_timezone(&Local);
        output::warning(&format!(
            "Cached search is from {}; run 'nexus search' for current results.",
            taken.format("%Y-%m-%d %H:%M:%S")
        ));
    }
}

/// Save a search result and apply the retention limit, if any.
fn save_search(settings: &Settings, result: &SearchResult) -> Result<String> {
    let cache = settings.cache();
    let id = cache.save(result).context("Failed to cache search results")?;

    if let Some(keep) = settings.cache_keep {
        let removed = cache.prune(keep).context("Failed to prune search cache")?;
        if removed > 0 {
            tracing::info!(removed, keep, "pruned old searches");
        }
    }

    Ok(id)
}
