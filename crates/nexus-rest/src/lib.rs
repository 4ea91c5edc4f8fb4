//! nexus-rest - REST-backed repository implementation.
//!
//! [`NexusRepository`] implements [`nexus_core::Repository`] against the
//! repository manager's versioned REST API (`/service/rest/v1`).
//!
//! # Example
//!
//! ```no_run
//! use nexus_core::{HostUrl, Repository};
//! use nexus_rest::{ClientConfig, Credentials, NexusRepository};
//!
//! # async fn example() -> nexus_core::Result<()> {
//! let host = HostUrl::new("https://nexus.example.com")?;
//! let config = ClientConfig::new(host).with_credentials(Credentials::new("ci", "secret"));
//! let repo = NexusRepository::new(config)?;
//!
//! for asset in repo.search("raw-hosted", "MyProject/*.zip").await? {
//!     println!("{}", asset.path);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod credentials;
mod download;
mod endpoints;
mod error;
mod repository;

pub use config::{ClientConfig, DEFAULT_TIMEOUT};
pub use credentials::Credentials;
pub use repository::NexusRepository;
