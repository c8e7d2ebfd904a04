//! Binary snapshot cache keyed by the content hash of the source index.
//!
//! Parsing a large `searchindex.js` dominates startup, so validated snapshots
//! are persisted with postcard next to nothing else: the cache file name carries
//! the xxh3 hash of the source bytes, which makes stale entries unreachable
//! instead of requiring invalidation.

use super::{IndexSnapshot, SnapshotParts, loader};
use crate::config::CacheConfig;
use crate::error::{LoadError, Result};
use anyhow::Context;
use postcard::to_io;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

/// Where a loaded snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Deserialized from an existing cache file.
    Hit,
    /// Parsed from the source index (and written to the cache).
    Miss,
}

#[derive(Debug)]
pub struct CachedSnapshot {
    pub snapshot: IndexSnapshot,
    pub status: CacheStatus,
    /// Content hash of the source index.
    pub source_hash: u64,
}

#[derive(Debug, Clone)]
pub struct SnapshotCache {
    directory: PathBuf,
}

impl SnapshotCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Returns `None` when caching is disabled or no cache directory can be determined.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        config.resolved_directory().map(Self::new)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Cache file for a source index with the given content hash.
    pub fn entry_path(&self, source: &Path, hash: u64) -> PathBuf {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("index");
        self.directory.join(format!("{}-{:016x}.snapshot", stem, hash))
    }

    /// Loads the snapshot for `path`, from the cache when its content hash is known.
    pub async fn load_or_parse(&self, path: &Path) -> Result<CachedSnapshot> {
        let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source_hash = xxh3_64(&bytes);
        let cache_path = self.entry_path(path, source_hash);

        if let Some(snapshot) = Self::read(&cache_path).await {
            tracing::debug!(
                "Loaded cached snapshot for {} from {}",
                path.display(),
                cache_path.display()
            );
            return Ok(CachedSnapshot {
                snapshot,
                status: CacheStatus::Hit,
                source_hash,
            });
        }

        // Parsing is CPU bound
        let snapshot = tokio::task::spawn_blocking(move || loader::load(&bytes))
            .await
            .context("Index parsing task panicked")??;

        self.store(&snapshot, &cache_path).await;

        Ok(CachedSnapshot {
            snapshot,
            status: CacheStatus::Miss,
            source_hash,
        })
    }

    /// Reads a cache file, discarding it if it cannot be decoded or validated.
    async fn read(path: &Path) -> Option<IndexSnapshot> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
                Err(e) => {
                    tracing::warn!("Failed to read snapshot cache {}: {}", path.display(), e);
                    return None;
                }
            };

            let snapshot = postcard::from_bytes::<SnapshotParts>(&bytes)
                .map_err(|e| e.to_string())
                .and_then(|parts| IndexSnapshot::from_parts(parts).map_err(|e| e.to_string()));

            match snapshot {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    tracing::warn!("Discarding corrupt snapshot cache {}: {}", path.display(), e);
                    let _ = std::fs::remove_file(&path);
                    None
                }
            }
        })
        .await
        .ok()?
    }

    /// Writes a snapshot to the cache. Failures only cost the next load a re-parse.
    async fn store(&self, snapshot: &IndexSnapshot, path: &Path) {
        if let Err(e) = tokio::fs::create_dir_all(&self.directory).await {
            tracing::warn!(
                "Failed to create cache directory {}: {}",
                self.directory.display(),
                e
            );
            return;
        }

        let path = path.to_path_buf();
        let parts = snapshot.to_parts();

        let written = tokio::task::spawn_blocking(move || {
            match std::fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&path)
            {
                Ok(mut file) => {
                    if let Err(e) = to_io(&parts, &mut file) {
                        tracing::warn!("Failed to write snapshot cache {}: {}", path.display(), e);
                        let _ = std::fs::remove_file(&path);
                    } else {
                        tracing::debug!("Cached snapshot to {}", path.display());
                    }
                }
                Err(e) if e.kind() != std::io::ErrorKind::AlreadyExists => {
                    tracing::warn!("Failed to create snapshot cache {}: {}", path.display(), e);
                }
                _ => {
                    // Another process wrote the same content hash
                    tracing::debug!("Snapshot cache already exists at {}", path.display());
                }
            }
        })
        .await;

        if let Err(e) = written {
            tracing::warn!("Snapshot cache task failed: {}", e);
        }
    }
}
