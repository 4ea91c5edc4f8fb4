//! Asset search types.
//!
//! The search operations themselves live on the
//! [`Repository`](crate::Repository) trait.

mod types;

pub use types::{AssetPage, AssetRecord, SearchQuery, SearchResult};
