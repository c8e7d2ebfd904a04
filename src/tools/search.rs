//! Ranked search over the active documentation index.

use crate::search::SearchOptions;
use crate::state::{DocState, SearchOutcome};
use rmcp::schemars;
use serde::Deserialize;
use std::sync::Arc;

/// Upper bound on requested results.
const MAX_LIMIT: usize = 500;

/// Response text for a search cancelled by a newer one.
pub const SUPERSEDED_RESPONSE: &str = "Search superseded by a newer query.";

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Search query: words to find, a dotted object name, or `-word` to exclude pages
    pub query: String,
    /// Maximum number of results to return (default from configuration, usually 50)
    #[serde(default)]
    pub limit: Option<usize>,
    /// Treat the last word as a prefix that is still being typed
    #[serde(default)]
    pub as_you_type: bool,
}

/// Executes a search against the active index.
pub async fn handle_search(state: &Arc<DocState>, request: SearchRequest) -> Result<String, String> {
    let limit = request
        .limit
        .unwrap_or(state.config().output.default_limit)
        .min(MAX_LIMIT);
    let options = SearchOptions {
        limit,
        as_you_type: request.as_you_type,
    };

    match state
        .search(&request.query, options)
        .await
        .map_err(|e| format!("{:#}", e))?
    {
        SearchOutcome::Completed(text) => Ok(text),
        SearchOutcome::Superseded => Ok(SUPERSEDED_RESPONSE.to_string()),
    }
}
