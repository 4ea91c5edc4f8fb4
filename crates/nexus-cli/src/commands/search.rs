//! Search command implementation.

use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use nexus_core::WildcardPattern;

use crate::config::Settings;
use crate::{output, pipeline};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Wildcard patterns matched against asset paths (`*` any run, `?` one character)
    #[arg(required = true)]
    pub patterns: Vec<String>,
}

/// Parse patterns up front so a bad one fails before any request.
pub fn parse_patterns(values: &[String]) -> Result<Vec<WildcardPattern>> {
    values
        .iter()
        .map(|v| WildcardPattern::new(v.as_str()).with_context(|| format!("Invalid pattern '{}'", v)))
        .collect()
}

pub async fn run(settings: &Settings, args: SearchArgs) -> Result<()> {
    let patterns = parse_patterns(&args.patterns)?;
    let repository = settings.repository()?;
    let repo = settings.connect()?;

    eprintln!(
        "{}",
        format!("Searching {} in {}...", repository, repo.host()).dimmed()
    );

    let started = Instant::now();
    let outcome = pipeline::search(&repo, repository, &patterns, Utc::now())
        .await
        .context("Search failed")?;
    let elapsed = started.elapsed();

    let id = super::save_search(settings, &outcome.result)?;

    for count in &outcome.counts {
        output::field(&count.pattern, &format!("{} assets", count.count));
    }
    println!();
    output::success(&format!(
        "Found {} assets in {:.2}s",
        outcome.result.len(),
        elapsed.as_secs_f64()
    ));
    output::field("Cached as", &id);

    Ok(())
}
