//! MCP server exposing the search engine as tools.

use crate::state::DocState;
use crate::tools::index_info::{IndexInfoRequest, handle_index_info};
use crate::tools::load_index::{LoadIndexRequest, handle_load_index};
use crate::tools::lookup::{LookupObjectRequest, handle_lookup_object};
use crate::tools::search::{SearchRequest, handle_search};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use std::borrow::Cow;
use std::sync::Arc;

/// MCP Server for documentation search
#[derive(Clone)]
pub struct SearchServer {
    /// Shared state (active index, response cache)
    state: Arc<DocState>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for SearchServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchServer")
            .field("state", &self.state)
            .finish()
    }
}

#[tool_router]
impl SearchServer {
    pub fn with_state(state: Arc<DocState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Search the loaded documentation. Exact object names (e.g. 'Cache.evict') rank first, then objects whose dotted name ends with the query, then pages matching the query words. Prefix a word with '-' to exclude pages containing it. Set as_you_type to match the last word as a prefix.",
        input_schema = inline_schema_for_type::<SearchRequest>()
    )]
    async fn search(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.state, request).await
    }

    #[tool(
        description = "Resolve an API object by name. Shows the exact match and every object whose dotted name ends with the given name, with kind, enclosing containers and page URL.",
        input_schema = inline_schema_for_type::<LookupObjectRequest>()
    )]
    async fn lookup_object(
        &self,
        Parameters(request): Parameters<LookupObjectRequest>,
    ) -> std::result::Result<String, String> {
        handle_lookup_object(&self.state, request)
            .await
            .map_err(|e| format!("{:#}", e))
    }

    #[tool(
        description = "Load a Sphinx search index (searchindex.js, or the HTML build directory containing it) and make it the active index. Replaces any previously loaded index.",
        input_schema = inline_schema_for_type::<LoadIndexRequest>()
    )]
    async fn load_index(
        &self,
        Parameters(request): Parameters<LoadIndexRequest>,
    ) -> std::result::Result<String, String> {
        handle_load_index(&self.state, request)
            .await
            .map_err(|e| format!("{:#}", e))
    }

    #[tool(
        description = "Show statistics about the active index: document, term and object counts, envversion, and object kinds."
    )]
    async fn index_info(&self) -> std::result::Result<String, String> {
        handle_index_info(&self.state, IndexInfoRequest::default())
            .await
            .map_err(|e| format!("{:#}", e))
    }
}

#[tool_handler]
impl ServerHandler for SearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "sphinx-search: Search Sphinx-generated documentation by API object name or prose. \
                 Use load_index with the path to a searchindex.js file (or its HTML build directory) \
                 unless an index was loaded at startup, then use search and lookup_object.",
            )
    }
}

/// Expands tilde (`~`) in a path to the user's home directory.
///
/// - `~/foo` becomes `/home/user/foo`
/// - `~` becomes `/home/user`
/// - Other paths are returned unchanged
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}

/// Generate an inline JSON schema for MCP tools
///
/// Sets `inline_subschemas = true` so nested types are inlined instead of
/// emitted as `$ref` definitions.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let object = serde_json::to_value(schema).expect("failed to serialize schema");

    let json_object = match object {
        serde_json::Value::Object(object) => object,
        _ => panic!("Schema serialization produced non-object value"),
    };

    Arc::new(json_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    #[rstest]
    #[case("/abs/path", "/abs/path")]
    #[case("relative/path", "relative/path")]
    #[case("~user/x", "~user/x")]
    fn test_expand_tilde_passthrough(#[case] input: &str, #[case] expected: &str) {
        check!(expand_tilde(input) == expected);
    }

    #[test]
    fn test_expand_tilde_home() {
        if let Some(home) = dirs::home_dir() {
            check!(expand_tilde("~/docs") == home.join("docs").display().to_string());
        }
    }

    #[test]
    fn test_server_info_advertises_tools() {
        let server = SearchServer::with_state(Arc::new(DocState::new(Default::default())));
        let info = server.get_info();
        check!(info.capabilities.tools.is_some());
        let_assert!(Some(instructions) = info.instructions);
        check!(instructions.contains("load_index"));
    }

    #[test]
    fn test_search_schema_is_object() {
        let schema = inline_schema_for_type::<SearchRequest>();
        check!(schema.contains_key("properties"));
    }
}
