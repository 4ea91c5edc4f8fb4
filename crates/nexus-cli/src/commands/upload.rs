//! Upload command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;

use nexus_core::{Repository, UploadProperties, UploadRequest};

use crate::config::Settings;
use crate::output;

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// File to upload
    pub file: PathBuf,

    /// Asset name in the repository (defaults to the file name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Directory in the repository
    #[arg(short, long, default_value = "/")]
    pub directory: String,

    /// Extra component property as key=value (repeatable)
    #[arg(short = 'P', long = "property")]
    pub properties: Vec<String>,
}

pub async fn run(settings: &Settings, args: UploadArgs) -> Result<()> {
    let properties =
        UploadProperties::from_pairs(&args.properties).context("Invalid upload property")?;

    let metadata = tokio::fs::metadata(&args.file)
        .await
        .with_context(|| format!("Cannot read {}", args.file.display()))?;
    if !metadata.is_file() {
        bail!("{} is not a regular file", args.file.display());
    }

    let repository = settings.repository()?;
    let repo = settings.connect()?;

    let mut request = UploadRequest::new(repository, &args.file)
        .with_directory(args.directory)
        .with_properties(properties);
    if let Some(name) = args.name {
        request = request.with_name(name);
    }

    eprintln!(
        "{}",
        format!(
            "Uploading {} ({} bytes) to {}...",
            args.file.display(),
            metadata.len(),
            repository
        )
        .dimmed()
    );

    let receipt = repo.upload(&request).await.context("Upload failed")?;

    output::success("Upload complete");
    output::field("Asset", &receipt.to_string());

    Ok(())
}
