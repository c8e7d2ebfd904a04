//! Shared server state: the loaded snapshot, the response cache, and
//! cancellation of superseded searches.

use crate::config::SearchConfig;
use crate::error::Result;
use crate::format::{build_hits, render_hits};
use crate::search::{QueryEngine, SearchOptions};
use crate::snapshot::{CacheStatus, IndexSnapshot, SnapshotCache, load_file};
use anyhow::Context;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

/// Maximum number of rendered search responses kept in memory.
const RESPONSE_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(64).unwrap();

/// `(query, limit, as_you_type)`
type ResponseKey = (String, usize, bool);

/// A snapshot together with where it came from.
#[derive(Debug)]
pub struct LoadedIndex {
    pub path: PathBuf,
    pub snapshot: IndexSnapshot,
    /// `None` when the snapshot cache is disabled.
    pub cache_status: Option<CacheStatus>,
    pub loaded_at: Instant,
}

/// Result of a search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Rendered result text.
    Completed(String),
    /// A newer search started before this one finished.
    Superseded,
}

/// Shared state for the MCP server.
///
/// One snapshot is active at a time. Searches read it through an `Arc`, so
/// replacing it never blocks or invalidates searches already running.
pub struct DocState {
    config: SearchConfig,
    engine: Arc<QueryEngine>,
    cache: Option<SnapshotCache>,

    /// Currently active index
    index: RwLock<Option<Arc<LoadedIndex>>>,

    /// Token of the most recent in-flight search
    in_flight: Mutex<Option<CancellationToken>>,

    /// Rendered responses for the active index
    responses: Mutex<LruCache<ResponseKey, String>>,
}

impl std::fmt::Debug for DocState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocState")
            .field("has_index", &self.index.try_read().is_ok_and(|i| i.is_some()))
            .field("has_cache", &self.cache.is_some())
            .finish()
    }
}

impl DocState {
    /// Creates state with the snapshot cache configured by `config`.
    pub fn new(config: SearchConfig) -> Self {
        let cache = SnapshotCache::from_config(&config.cache);
        Self::with_cache(config, cache)
    }

    pub fn with_cache(config: SearchConfig, cache: Option<SnapshotCache>) -> Self {
        Self {
            engine: Arc::new(QueryEngine::new(&config)),
            config,
            cache,
            index: RwLock::new(None),
            in_flight: Mutex::new(None),
            responses: Mutex::new(LruCache::new(RESPONSE_CACHE_SIZE)),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Get the active index, if one has been loaded.
    pub async fn index(&self) -> Option<Arc<LoadedIndex>> {
        self.index.read().await.clone()
    }

    /// Loads an index file and makes it the active one.
    ///
    /// On failure the previously active index stays in place.
    pub async fn load_index(&self, path: &Path) -> Result<Arc<LoadedIndex>> {
        let (snapshot, cache_status) = match &self.cache {
            Some(cache) => {
                let cached = cache.load_or_parse(path).await?;
                (cached.snapshot, Some(cached.status))
            }
            None => {
                let owned = path.to_path_buf();
                let snapshot = tokio::task::spawn_blocking(move || load_file(&owned))
                    .await
                    .context("Index loading task panicked")??;
                (snapshot, None)
            }
        };

        let loaded = Arc::new(LoadedIndex {
            path: path.to_path_buf(),
            snapshot,
            cache_status,
            loaded_at: Instant::now(),
        });

        // Swap and clear under the response lock, same as `store_response`
        let mut responses = self.responses.lock().await;
        *self.index.write().await = Some(loaded.clone());
        responses.clear();
        drop(responses);
        tracing::info!("Active index is now {}", path.display());

        Ok(loaded)
    }

    /// Runs a search against the active index.
    ///
    /// Starting a search cancels the previous one still in flight; the
    /// cancelled caller receives [`SearchOutcome::Superseded`].
    pub async fn search(&self, query: &str, options: SearchOptions) -> Result<SearchOutcome> {
        let loaded = self
            .index()
            .await
            .context("No index loaded. Use load_index with the path to a searchindex.js file.")?;

        let key = (query.to_string(), options.limit, options.as_you_type);
        if let Some(text) = self.responses.lock().await.get(&key) {
            tracing::debug!("Response cache hit for '{}'", query);
            return Ok(SearchOutcome::Completed(text.clone()));
        }

        let token = CancellationToken::new();
        if let Some(previous) = self.in_flight.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        let engine = self.engine.clone();
        let output = self.config.output.clone();
        let task_index = loaded.clone();
        let task_query = query.to_string();
        let task = tokio::task::spawn_blocking(move || {
            let snapshot = &task_index.snapshot;
            let results = engine.search(snapshot, &task_query, options)?;
            let hits = build_hits(snapshot, &results, &output);
            Ok::<_, crate::error::SearchError>(render_hits(&task_query, &hits))
        });

        let text = tokio::select! {
            () = token.cancelled() => {
                tracing::debug!("Search '{}' superseded", query);
                return Ok(SearchOutcome::Superseded);
            }
            joined = task => joined.context("Search task panicked")??,
        };

        self.store_response(&loaded, key, text.clone()).await;
        Ok(SearchOutcome::Completed(text))
    }

    /// Caches a rendered response if `rendered_for` is still the active index.
    ///
    /// Returns whether the response was stored.
    async fn store_response(
        &self,
        rendered_for: &Arc<LoadedIndex>,
        key: ResponseKey,
        text: String,
    ) -> bool {
        let mut responses = self.responses.lock().await;
        let still_active = self
            .index
            .read()
            .await
            .as_ref()
            .is_some_and(|active| Arc::ptr_eq(active, rendered_for));
        if still_active {
            responses.put(key, text);
        }
        still_active
    }
}
