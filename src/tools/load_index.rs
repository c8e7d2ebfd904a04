//! Loading a documentation index into the server.

use crate::error::Result;
use crate::server::expand_tilde;
use crate::snapshot::CacheStatus;
use crate::state::{DocState, LoadedIndex};
use anyhow::{Context, anyhow};
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

/// File searched for when `path` names a directory.
const INDEX_FILE_NAME: &str = "searchindex.js";

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LoadIndexRequest {
    /// Path to a searchindex.js file, or to the HTML build directory containing one
    pub path: String,
}

/// Loads an index and makes it the active one.
pub async fn handle_load_index(state: &Arc<DocState>, request: LoadIndexRequest) -> Result<String> {
    let path = resolve_index_path(&request.path)?;
    let previous = state.index().await;

    let loaded = state
        .load_index(&path)
        .await
        .with_context(|| format!("Failed to load index {}", path.display()))?;

    Ok(format_response(&loaded, previous.as_deref()))
}

/// Expands `~`, canonicalizes, and appends `searchindex.js` for directories.
pub fn resolve_index_path(raw: &str) -> Result<PathBuf> {
    let expanded = PathBuf::from(expand_tilde(raw).as_ref());
    let canonical = std::fs::canonicalize(&expanded)
        .map_err(|e| anyhow!("Failed to resolve path '{}': {}", raw, e))?;

    if canonical.is_dir() {
        let candidate = canonical.join(INDEX_FILE_NAME);
        if !candidate.is_file() {
            return Err(anyhow!(
                "No {} found in directory: {}",
                INDEX_FILE_NAME,
                canonical.display()
            ));
        }
        return Ok(candidate);
    }
    Ok(canonical)
}

fn format_response(loaded: &LoadedIndex, previous: Option<&LoadedIndex>) -> String {
    let snapshot = &loaded.snapshot;
    let mut response = format!(
        "Loaded {}: {} documents, {} terms, {} objects (envversion {})",
        loaded.path.display(),
        snapshot.document_count(),
        snapshot.terms().len(),
        snapshot.objects().len(),
        snapshot.env_version()
    );

    match loaded.cache_status {
        Some(CacheStatus::Hit) => response.push_str("\nSource: snapshot cache"),
        Some(CacheStatus::Miss) => response.push_str("\nSource: parsed (snapshot cached)"),
        None => response.push_str("\nSource: parsed"),
    }

    if let Some(previous) = previous
        && previous.path != loaded.path
    {
        let _ = write!(response, "\nReplaced: {}", previous.path.display());
    }
    response
}
