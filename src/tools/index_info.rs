use crate::error::Result;
use crate::format::render_index_info;
use crate::state::DocState;
use anyhow::anyhow;
use rmcp::schemars;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct IndexInfoRequest {}

/// Summarizes the active index: counts, envversion and object kinds.
pub async fn handle_index_info(state: &Arc<DocState>, _request: IndexInfoRequest) -> Result<String> {
    let loaded = state
        .index()
        .await
        .ok_or_else(|| anyhow!("No index loaded. Use load_index first."))?;

    Ok(render_index_info(
        &loaded.snapshot,
        &loaded.path.display().to_string(),
    ))
}
