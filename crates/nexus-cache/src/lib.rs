//! nexus-cache - On-disk cache of search results.

mod store;

pub use store::{CacheEntry, SearchCache};
