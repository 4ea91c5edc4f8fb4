//! Search result types.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One remote file matched by a search.
///
/// Field names follow the server's JSON so a record round-trips through
/// the cache unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// Repository the asset lives in.
    pub repository: String,

    /// Full path of the asset inside the repository.
    pub path: String,

    /// Direct content URL, absolute or relative to the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    /// Checksums keyed by algorithm (`sha1`, `md5`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<BTreeMap<String, String>>,

    /// Server-side asset identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Repository format (`raw`, `maven2`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Size in bytes, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl AssetRecord {
    /// Create a record with only the required fields set.
    pub fn new(repository: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            path: path.into(),
            download_url: None,
            checksum: None,
            id: None,
            format: None,
            content_type: None,
            file_size: None,
            last_modified: None,
        }
    }

    /// Set the download URL.
    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }

    /// Returns the checksum for an algorithm, if known.
    pub fn checksum(&self, algorithm: &str) -> Option<&str> {
        self.checksum
            .as_ref()
            .and_then(|c| c.get(algorithm))
            .map(String::as_str)
    }
}

/// The query that produced a [`SearchResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Repository searched.
    pub repository: String,
    /// Patterns in the order they were issued.
    pub patterns: Vec<String>,
}

impl SearchQuery {
    pub fn new(repository: impl Into<String>, patterns: Vec<String>) -> Self {
        Self {
            repository: repository.into(),
            patterns,
        }
    }
}

/// The complete outcome of one search invocation.
///
/// This is the unit of caching. A new search produces a new result that
/// supersedes the previous one; results are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: SearchQuery,

    /// When the search was run.
    pub timestamp: DateTime<Utc>,

    /// Matched assets in server order, patterns concatenated in query order.
    pub assets: Vec<AssetRecord>,
}

impl SearchResult {
    pub fn new(query: SearchQuery, timestamp: DateTime<Utc>, assets: Vec<AssetRecord>) -> Self {
        Self {
            query,
            timestamp,
            assets,
        }
    }

    /// Returns true if the result was captured on a different calendar day
    /// than `reference`, judged in the reference's time zone.
    pub fn is_stale<Tz: TimeZone>(&self, reference: &DateTime<Tz>) -> bool {
        let captured = self.timestamp.with_timezone(&reference.timezone());
        captured.date_naive() != reference.date_naive()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// One page of a paginated asset search.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPage {
    /// The assets in this page.
    #[serde(default)]
    pub items: Vec<AssetRecord>,

    /// Token for the next page, if more assets exist.
    #[serde(default)]
    pub continuation_token: Option<String>,
}

impl AssetPage {
    /// Returns the token for the next page.
    ///
    /// Servers signal the last page with `null`, a missing field, or an
    /// empty string; all three end pagination.
    pub fn next_token(&self) -> Option<&str> {
        self.continuation_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_at(rfc3339: &str) -> SearchResult {
        SearchResult::new(
            SearchQuery::new("my-repo", vec!["*.zip".to_string()]),
            DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc),
            Vec::new(),
        )
    }

    #[test]
    fn stale_when_captured_on_earlier_day() {
        let result = result_at("2025-01-01T23:59:00Z");
        let reference = DateTime::parse_from_rfc3339("2025-01-02T00:01:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(result.is_stale(&reference));
    }

    #[test]
    fn fresh_on_same_day_regardless_of_time() {
        let result = result_at("2025-01-01T00:00:01Z");
        let reference = DateTime::parse_from_rfc3339("2025-01-01T23:59:59Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(!result.is_stale(&reference));
    }

    #[test]
    fn staleness_uses_reference_time_zone() {
        // 23:30 UTC on Jan 1 is already Jan 2 at UTC+2.
        let result = result_at("2025-01-01T23:30:00Z");
        let reference = DateTime::parse_from_rfc3339("2025-01-02T08:00:00+02:00").unwrap();
        assert!(!result.is_stale(&reference));

        assert!(result.is_stale(&reference.with_timezone(&Utc)));
    }

    #[test]
    fn asset_record_parses_server_payload() {
        let record: AssetRecord = serde_json::from_value(json!({
            "downloadUrl": "https://nexus.example.com/repository/raw/a/b.zip",
            "path": "a/b.zip",
            "id": "cmF3OjEyMw",
            "repository": "raw",
            "format": "raw",
            "checksum": {"sha1": "abc", "md5": "def"},
            "contentType": "application/zip",
            "lastModified": "2025-01-01T10:00:00.000+00:00",
            "fileSize": 1024,
            "uploader": "ci"
        }))
        .unwrap();

        assert_eq!(record.repository, "raw");
        assert_eq!(record.checksum("sha1"), Some("abc"));
        assert_eq!(record.file_size, Some(1024));
    }

    #[test]
    fn page_token_end_markers() {
        let page: AssetPage =
            serde_json::from_value(json!({"items": [], "continuationToken": null})).unwrap();
        assert_eq!(page.next_token(), None);

        let page: AssetPage = serde_json::from_value(json!({"items": []})).unwrap();
        assert_eq!(page.next_token(), None);

        let page: AssetPage =
            serde_json::from_value(json!({"items": [], "continuationToken": ""})).unwrap();
        assert_eq!(page.next_token(), None);

        let page: AssetPage =
            serde_json::from_value(json!({"items": [], "continuationToken": "abc"})).unwrap();
        assert_eq!(page.next_token(), Some("abc"));
    }
}
