//! Download command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{Local, Utc};
use clap::{Args, ValueEnum};
use colored::Colorize;

use nexus_core::{CollisionPolicy, PathPlanner};

use crate::config::Settings;
use crate::pipeline::{self, DEFAULT_CONCURRENCY, DownloadOutcome};
use crate::output;

use super::search::parse_patterns;

/// What to do when two assets map to the same local file.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OnCollision {
    /// Refuse to download anything
    #[default]
    Abort,
    /// Rename later files to name~N.ext
    Suffix,
}

impl From<OnCollision> for CollisionPolicy {
    fn from(value: OnCollision) -> Self {
        match value {
            OnCollision::Abort => CollisionPolicy::Abort,
            OnCollision::Suffix => CollisionPolicy::Suffix,
        }
    }
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Run a fresh search with these patterns instead of using the cached one
    #[arg(short, long = "pattern", num_args = 1..)]
    pub patterns: Vec<String>,

    /// Directory the timestamped artifacts folder is created in
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Maximum simultaneous downloads
    #[arg(short = 'j', long, default_value_t = DEFAULT_CONCURRENCY as u16, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// How to handle assets that map to the same local file
    #[arg(long, value_enum, default_value_t = OnCollision::Abort)]
    pub on_collision: OnCollision,
}

pub async fn run(settings: &Settings, args: DownloadArgs) -> Result<()> {
    let repo = settings.connect()?;

    let result = if args.patterns.is_empty() {
        let result = settings
            .cache()
            .load_latest()
            .context("Failed to load cached search")?;
        super::warn_if_stale(&result);
        result
    } else {
        let patterns = parse_patterns(&args.patterns)?;
        let repository = settings.repository()?;

        let outcome = pipeline::search(&repo, repository, &patterns, Utc::now())
            .await
            .context("Search failed")?;
        let id = super::save_search(settings, &outcome.result)?;
        tracing::info!(%id, assets = outcome.result.len(), "cached fresh search");
        outcome.result
    };

    if result.is_empty() {
        eprintln!("{}", "Nothing to download.".dimmed());
        return Ok(());
    }

    let root = pipeline::output_root(&args.output_dir, &Local::now());
    let plans = PathPlanner::new(args.on_collision.into())
        .plan_all(&result.assets, &root)
        .context("Cannot plan downloads")?;

    tokio::fs::create_dir_all(&root)
        .await
        .with_context(|| format!("Failed to create {}", root.display()))?;

    eprintln!(
        "{}",
        format!("Downloading {} assets to {}...", plans.len(), root.display()).dimmed()
    );

    let total = plans.len();
    let report = pipeline::download_all(&repo, plans, args.concurrency.into(), report_outcome).await;

    println!();
    output::field("Succeeded", &report.succeeded().to_string());
    output::field("Failed", &report.failed_count().to_string());
    output::field("Output", &root.display().to_string());

    if !report.is_success() {
        bail!("{} of {} downloads failed", report.failed_count(), total);
    }

    output::success(&format!("Downloaded {} bytes", report.total_bytes()));
    Ok(())
}

fn report_outcome(outcome: &DownloadOutcome) {
    match &outcome.result {
        Ok(bytes) => output::success(&format!(
            "{} ({} bytes)",
            outcome.plan.local_path.display(),
            bytes
        )),
        Err(e) => output::error(&format!("{}: {}", outcome.plan.asset.path, e)),
    }
}
