//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::{download, list, search, upload};
use crate::config::parse_flag;

/// Search, list, download and upload artifacts in a Nexus repository.
#[derive(Parser, Debug)]
#[command(name = "nexus")]
#[command(author, version = env!("NEXUS_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection and cache settings shared by every command.
///
/// Flags win over environment variables, which win over defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Repository manager base URL
    #[arg(long, env = "NEXUS_HOST", global = true)]
    pub host: Option<String>,

    /// Repository to search or upload to
    #[arg(short, long, env = "NEXUS_REPOSITORY", global = true)]
    pub repository: Option<String>,

    /// Username for basic authentication
    #[arg(short, long, env = "NEXUS_USER", global = true)]
    pub user: Option<String>,

    /// Password for basic authentication
    #[arg(long, env = "NEXUS_PASS", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "NEXUS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Verify the server's TLS certificate (true/false)
    #[arg(long, env = "NEXUS_VERIFY_SSL", value_parser = parse_flag, global = true)]
    pub verify_ssl: Option<bool>,

    /// Directory holding cached search results
    #[arg(long, env = "NEXUS_CACHE_DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Keep only the newest N cached searches
    #[arg(long, env = "NEXUS_CACHE_KEEP", global = true)]
    pub cache_keep: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the repository and cache the results
    Search(search::SearchArgs),

    /// Show the most recent cached search
    List(list::ListArgs),

    /// Download assets from a fresh search or the cached one
    Download(download::DownloadArgs),

    /// Upload a file as a raw component
    Upload(upload::UploadArgs),
}
