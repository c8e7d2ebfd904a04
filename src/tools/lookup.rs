use crate::error::Result;
use crate::format::render_lookup;
use crate::state::DocState;
use anyhow::anyhow;
use rmcp::schemars;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LookupObjectRequest {
    /// Qualified or partial object name, e.g. `Cache.evict` or `evict`
    pub name: String,
}

/// Resolves an object name exactly and by dotted suffix, with breadcrumbs.
pub async fn handle_lookup_object(
    state: &Arc<DocState>,
    request: LookupObjectRequest,
) -> Result<String> {
    let loaded = state
        .index()
        .await
        .ok_or_else(|| anyhow!("No index loaded. Use load_index first."))?;

    if request.name.trim().is_empty() {
        return Err(anyhow!("Object name must not be empty"));
    }

    Ok(render_lookup(
        &loaded.snapshot,
        &request.name,
        &state.config().output,
    ))
}
