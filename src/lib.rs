//! Search engine for Sphinx-generated documentation indexes.
//!
//! Loads a `searchindex.js` into an immutable [`IndexSnapshot`] and answers
//! queries against it: exact and suffix API object lookups rank above prose
//! term matches. Served from the command line or as an MCP server.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod search;
pub mod server;
pub mod snapshot;
pub mod state;
pub mod tools;
pub mod tracing;

pub use config::SearchConfig;
pub use error::{ConfigError, LoadError, SearchError};
pub use search::{MatchSource, QueryEngine, ScoredResult, SearchOptions, Tier, search};
pub use server::SearchServer;
pub use snapshot::{
    DocId, Document, IndexSnapshot, ObjectEntry, ObjectKind, ObjectPriority, SnapshotBuilder,
    SnapshotCache, load, load_file,
};
pub use state::{DocState, SearchOutcome};
