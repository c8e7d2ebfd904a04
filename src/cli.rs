//! Command-line interface.

use crate::config::SearchConfig;
use crate::error::Result;
use crate::format::{build_hits, render_hits, render_index_info, render_lookup};
use crate::search::SearchOptions;
use crate::server::{SearchServer, expand_tilde};
use crate::snapshot::SnapshotCache;
use crate::state::{DocState, LoadedIndex};
use crate::tools::load_index::resolve_index_path;
use crate::tracing::LogFormat;
use anyhow::Context;
use clap::{Parser, Subcommand};
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "sphinx-search", version)]
#[command(about = "Search Sphinx documentation indexes from the command line or over MCP", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Always parse the index, bypassing the snapshot cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Log output format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search an index and print ranked results
    Search {
        /// Path to searchindex.js or its build directory
        index: String,
        query: String,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Match the last word as a prefix
        #[arg(long)]
        as_you_type: bool,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve an object name exactly and by dotted suffix
    Lookup { index: String, name: String },
    /// Print index statistics
    Inspect { index: String },
    /// Run the MCP server on stdio
    Serve {
        /// Index to load at startup
        #[arg(long)]
        index: Option<String>,
    },
}

impl Cli {
    /// Loads the configuration named by `--config`, or the defaults.
    pub fn load_config(&self) -> Result<SearchConfig> {
        let Some(path) = &self.config else {
            return Ok(SearchConfig::default());
        };
        let path = PathBuf::from(expand_tilde(path).as_ref());
        SearchConfig::load(&path).with_context(|| format!("Failed to load config {}", path.display()))
    }

    fn state(&self, config: SearchConfig) -> Arc<DocState> {
        let cache = if self.no_cache {
            None
        } else {
            SnapshotCache::from_config(&config.cache)
        };
        Arc::new(DocState::with_cache(config, cache))
    }
}

/// Runs the parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    let state = cli.state(config);

    match cli.command {
        Commands::Search {
            index,
            query,
            limit,
            as_you_type,
            json,
        } => {
            let loaded = load(&state, &index).await?;
            let options = SearchOptions {
                limit: limit.unwrap_or(state.config().output.default_limit),
                as_you_type,
            };
            let results = state.engine().search(&loaded.snapshot, &query, options)?;
            let hits = build_hits(&loaded.snapshot, &results, &state.config().output);
            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                print!("{}", render_hits(&query, &hits));
            }
        }
        Commands::Lookup { index, name } => {
            let loaded = load(&state, &index).await?;
            print!(
                "{}",
                render_lookup(&loaded.snapshot, &name, &state.config().output)
            );
        }
        Commands::Inspect { index } => {
            let loaded = load(&state, &index).await?;
            print!(
                "{}",
                render_index_info(&loaded.snapshot, &loaded.path.display().to_string())
            );
        }
        Commands::Serve { index } => {
            if let Some(index) = index {
                load(&state, &index).await?;
            }

            tracing::info!("Starting sphinx-search MCP server");
            let server = SearchServer::with_state(state);
            let service = server.serve(stdio()).await.inspect_err(|e| {
                tracing::error!("Error serving MCP server: {:?}", e);
            })?;
            service.waiting().await?;
        }
    }

    Ok(())
}

async fn load(state: &DocState, index: &str) -> Result<Arc<LoadedIndex>> {
    let path = resolve_index_path(index)?;
    state
        .load_index(&path)
        .await
        .with_context(|| format!("Failed to load index {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search_with_globals() {
        let cli = Cli::try_parse_from([
            "sphinx-search",
            "search",
            "docs/_build/html",
            "cache evict",
            "-n",
            "5",
            "--no-cache",
        ])
        .unwrap();
        check!(cli.no_cache);
        check!(let Commands::Search { limit: Some(5), as_you_type: false, .. } = cli.command);
    }

    #[test]
    fn test_missing_config_is_error() {
        let cli = Cli::try_parse_from([
            "sphinx-search",
            "--config",
            "/nonexistent/sphinx-search.toml",
            "inspect",
            "x",
        ])
        .unwrap();
        check!(cli.load_config().is_err());
    }
}
