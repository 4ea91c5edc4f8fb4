//! REST endpoint definitions and request/response types.

use serde::{Deserialize, Serialize};

// ============================================================================
// Endpoint Names
// ============================================================================

/// Asset search, paginated by continuation token.
pub const SEARCH_ASSETS: &str = "search/assets";

/// Component upload.
pub const COMPONENTS: &str = "components";

// ============================================================================
// Raw upload form fields
// ============================================================================

pub const RAW_DIRECTORY: &str = "raw.directory";
pub const RAW_ASSET: &str = "raw.asset1";
pub const RAW_ASSET_FILENAME: &str = "raw.asset1.filename";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query string for search/assets.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAssetsQuery<'a> {
    pub repository: &'a str,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<&'a str>,
}

/// Query string for components.
#[derive(Debug, Serialize)]
pub struct ComponentsQuery<'a> {
    pub repository: &'a str,
}

/// One validation message as returned by the server.
#[derive(Debug, Deserialize)]
struct ErrorItem {
    #[serde(default)]
    id: Option<String>,
    message: String,
}

/// Error bodies arrive as a list of validation messages, a single object,
/// or plain text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    List(Vec<ErrorItem>),
    Single(ErrorItem),
}

/// Longest plain-text body echoed back in an error.
const MAX_ERROR_TEXT: usize = 200;

/// Extract a human-readable message from an error response body.
pub fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let render = |item: ErrorItem| match item.id {
        Some(id) if id != "*" && !id.is_empty() => format!("{}: {}", id, item.message),
        _ => item.message,
    };

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::List(items)) if !items.is_empty() => Some(
            items
                .into_iter()
                .map(render)
                .collect::<Vec<_>>()
                .join("; "),
        ),
        Ok(ErrorBody::Single(item)) => Some(render(item)),
        _ => Some(truncate(body, MAX_ERROR_TEXT)),
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
