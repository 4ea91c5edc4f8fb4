//! nexus-core - Core types and traits for the nexus artifact repository client.

pub mod error;
pub mod plan;
pub mod search;
pub mod traits;
pub mod types;

pub use error::Error;
pub use plan::{CollisionPolicy, DownloadPlan, PathPlanner};
pub use search::{AssetPage, AssetRecord, SearchQuery, SearchResult};
pub use traits::{Repository, UploadProperties, UploadReceipt, UploadRequest};
pub use types::{HostUrl, WildcardPattern};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
