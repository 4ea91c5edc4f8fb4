//! Validated core types.
//!
//! These types enforce their invariants at construction time, so a
//! pattern or host that reached the client is known to be well formed.

mod host_url;
pub mod pattern;

pub use host_url::HostUrl;
pub use pattern::WildcardPattern;
