//! Shared test fixtures and utilities for integration tests.
//!
//! # Test Isolation Strategy
//!
//! Tests that touch the filesystem use isolated workspaces. Each test gets:
//! - A fresh temporary directory with a copy of the fixture `searchindex.js`
//! - Its own `DocState` with an empty response cache
//! - Its own snapshot cache directory (cold cache state)
//!
//! # Available Fixtures
//!
//! - `fixture_snapshot`: the fixture index parsed in memory
//! - `isolated_workspace`: temp copy of the fixture, nothing loaded yet
//! - `loaded_workspace`: same, with the index already loaded into `state`

use rstest::fixture;
use sphinx_search::config::{CacheConfig, SearchConfig};
use sphinx_search::{DocState, IndexSnapshot, ScoredResult, load_file};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Two pages, "cache" in both, "evict" only in the first.
#[allow(dead_code)]
pub const CACHE_INDEX: &str = r#"{
    "envversion": 50,
    "filenames": ["a.html", "b.html"],
    "terms": {"cache": [0, 1], "evict": 0},
    "objects": {}
}"#;

/// [`CACHE_INDEX`] plus a `Cache.evict` method documented on the second page.
#[allow(dead_code)]
pub const CACHE_INDEX_WITH_OBJECT: &str = r#"{
    "envversion": 50,
    "filenames": ["a.html", "b.html"],
    "terms": {"cache": [0, 1], "evict": 0},
    "objects": {"Cache": {"evict": [1, 0, true, ""]}},
    "objnames": {"0": ["py", "method", "Python method"]}
}"#;

/// Returns the project root directory (where Cargo.toml lives).
pub fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Path of the fixture index generated by a real Sphinx build.
pub fn fixture_path() -> PathBuf {
    project_root().join("tests/fixtures/searchindex.js")
}

/// Document filenames of search results, in rank order.
#[allow(dead_code)]
pub fn filenames<'s>(results: &[ScoredResult<'s>]) -> Vec<&'s str> {
    results
        .iter()
        .map(|result| result.document.filename.as_str())
        .collect()
}

/// A temporary directory for test isolation.
///
/// Provides basic filesystem operations within a temp directory that is
/// automatically cleaned up when dropped.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    /// Creates a new empty temporary workspace.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    /// Returns the root path of this workspace.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content within this workspace.
    ///
    /// Parent directories are created automatically if they don't exist.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
        full_path
    }

    /// Copies a file from the real filesystem into this workspace.
    ///
    /// # Panics
    /// Panics if copying fails.
    pub fn copy_file(&self, source: &Path, dest_relative: &str) -> PathBuf {
        let dest = self.root.join(dest_relative);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!(
                    "Failed to create parent directory for '{}': {}",
                    dest_relative, e
                )
            });
        }
        std::fs::copy(source, &dest).unwrap_or_else(|e| {
            panic!(
                "Failed to copy '{}' to '{}': {}",
                source.display(),
                dest_relative,
                e
            )
        });
        dest
    }

    /// Lists files in a subdirectory, sorted by name. Missing directories are empty.
    pub fn list_files(&self, dir: &str) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.root.join(dir)) else {
            return vec![];
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        files.sort();
        files
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// An isolated workspace for server and cache tests.
///
/// Composes [`TempWorkspace`] with a `DocState` whose snapshot cache lives
/// inside the temp directory.
#[allow(dead_code)] // Fields used across different integration test crates
pub struct IsolatedWorkspace {
    pub workspace: TempWorkspace,
    pub state: Arc<DocState>,
    /// Copy of the fixture index, at `_build/html/searchindex.js`.
    pub index_path: PathBuf,
}

/// Snapshot cache directory, relative to the workspace root.
#[allow(dead_code)]
pub const CACHE_DIR: &str = "cache";

#[allow(dead_code)] // Methods used across different integration test crates
impl IsolatedWorkspace {
    pub fn new() -> Self {
        let workspace = TempWorkspace::new();
        let index_path = workspace.copy_file(&fixture_path(), "_build/html/searchindex.js");

        let config = SearchConfig {
            cache: CacheConfig {
                enabled: true,
                directory: Some(workspace.path().join(CACHE_DIR)),
            },
            ..SearchConfig::default()
        };
        let state = Arc::new(DocState::new(config));

        Self {
            workspace,
            state,
            index_path,
        }
    }

    /// Returns the root path of this workspace.
    pub fn root(&self) -> &Path {
        self.workspace.path()
    }

    /// Directory holding the built HTML, containing `searchindex.js`.
    pub fn html_dir(&self) -> PathBuf {
        self.root().join("_build/html")
    }
}

impl Default for IsolatedWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// The fixture index, parsed.
#[fixture]
pub fn fixture_snapshot() -> IndexSnapshot {
    load_file(&fixture_path()).expect("fixture index should load")
}

/// Creates an isolated workspace with nothing loaded.
#[fixture]
pub fn isolated_workspace() -> IsolatedWorkspace {
    IsolatedWorkspace::new()
}

/// Creates an isolated workspace with the fixture index already active.
///
/// Requires a multi-threaded runtime (`#[tokio::test(flavor = "multi_thread")]`).
#[fixture]
pub fn loaded_workspace() -> IsolatedWorkspace {
    let workspace = IsolatedWorkspace::new();
    tokio::task::block_in_place(|| {
        tokio::runtime::Handle::current().block_on(async {
            workspace
                .state
                .load_index(&workspace.index_path)
                .await
                .expect("fixture index should load");
        });
    });
    workspace
}
