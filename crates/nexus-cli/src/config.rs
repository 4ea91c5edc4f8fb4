//! Resolved runtime settings.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;

use nexus_cache::SearchCache;
use nexus_core::HostUrl;
use nexus_rest::{ClientConfig, Credentials, DEFAULT_TIMEOUT, NexusRepository};

use crate::cli::GlobalArgs;

/// Settings after applying defaults to the parsed flags and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    host: Option<String>,
    repository: Option<String>,
    credentials: Option<Credentials>,
    pub timeout: Duration,
    pub verify_tls: bool,
    pub cache_dir: PathBuf,
    pub cache_keep: Option<usize>,
}

impl Settings {
    pub fn resolve(args: GlobalArgs) -> Result<Self> {
        let cache_dir = match args.cache_dir {
            Some(dir) => dir,
            None => default_cache_dir()?,
        };

        let timeout = match args.timeout {
            Some(0) => bail!("Timeout must be at least one second"),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        if args.user.is_some() != args.password.is_some() {
            tracing::warn!("both a username and a password are needed for authentication; sending none");
        }

        Ok(Self {
            host: args.host.filter(|h| !h.trim().is_empty()),
            repository: args.repository.filter(|r| !r.trim().is_empty()),
            credentials: Credentials::from_parts(args.user.as_deref(), args.password.as_deref()),
            timeout,
            verify_tls: args.verify_ssl.unwrap_or(true),
            cache_dir,
            cache_keep: args.cache_keep,
        })
    }

    /// The validated host URL.
    pub fn host(&self) -> Result<HostUrl> {
        let host = self
            .host
            .as_deref()
            .context("No repository host configured. Use --host or set NEXUS_HOST.")?;
        HostUrl::new(host).context("Invalid host URL")
    }

    /// The repository name.
    pub fn repository(&self) -> Result<&str> {
        self.repository
            .as_deref()
            .context("No repository configured. Use --repository or set NEXUS_REPOSITORY.")
    }

    /// Build a REST client for the configured host.
    pub fn connect(&self) -> Result<NexusRepository> {
        let mut config = ClientConfig::new(self.host()?)
            .with_timeout(self.timeout)
            .with_verify_tls(self.verify_tls);
        if let Some(credentials) = &self.credentials {
            config = config.with_credentials(credentials.clone());
        }
        if !self.verify_tls {
            tracing::warn!("TLS certificate verification is disabled");
        }

        NexusRepository::new(config).context("Failed to create HTTP client")
    }

    pub fn cache(&self) -> SearchCache {
        SearchCache::new(&self.cache_dir)
    }
}

/// Get the default directory for cached searches.
fn default_cache_dir() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "nexus").context("Could not determine cache directory")?;
    Ok(dirs.cache_dir().join("searches"))
}

/// Parse a boolean setting. Anything but an explicit false value is true.
pub fn parse_flag(value: &str) -> Result<bool, std::convert::Infallible> {
    let value = value.trim().to_ascii_lowercase();
    Ok(!matches!(value.as_str(), "" | "false" | "0" | "no" | "off"))
}
