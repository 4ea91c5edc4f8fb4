//! List command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use nexus_core::WildcardPattern;

use crate::config::Settings;
use crate::output;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show assets whose path matches this wildcard pattern
    #[arg(long)]
    pub filter: Option<String>,

    /// Print the cached search as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(settings: &Settings, args: ListArgs) -> Result<()> {
    let filter = args
        .filter
        .as_deref()
        .map(WildcardPattern::new)
        .transpose()
        .context("Invalid filter")?;

    let mut result = settings
        .cache()
        .load_latest()
        .context("Failed to load cached search")?;

    super::warn_if_stale(&result);

    if let Some(filter) = &filter {
        result.assets.retain(|a| filter.matches(&a.path));
    }

    if args.json {
        return output::json_pretty(&result);
    }

    if result.is_empty() {
        eprintln!("{}", "No assets in the cached search.".dimmed());
        return Ok(());
    }

    for asset in &result.assets {
        output::asset(&asset.repository, &asset.path);
    }
    println!();
    output::field("Total", &result.len().to_string());

    Ok(())
}
