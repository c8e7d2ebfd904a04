//! Error handling types and utilities.

use std::path::PathBuf;

/// A specialized Result type for sphinx-search operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods at the binary and tool boundaries.
pub type Result<T> = anyhow::Result<T>;

/// Error returned when a search index cannot be turned into a snapshot.
///
/// No partial snapshot is ever exposed alongside one of these.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The payload does not have the shape of a search index, or violates
    /// one of its referential invariants (dangling document id, unknown kind code, ...).
    #[error("malformed search index: {reason}")]
    MalformedIndex { reason: String },

    /// The index was produced by a documentation build this engine does not understand.
    #[error("unsupported index envversion {found} (supported {min}..={max}); rebuild the documentation")]
    UnsupportedVersion { found: String, min: u32, max: u32 },

    /// The index file could not be read.
    #[error("failed to read search index at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedIndex {
            reason: reason.into(),
        }
    }
}

/// Error returned by a search call.
///
/// An unmatched query is not an error; this only signals a snapshot that passed
/// load-time validation but is still inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("internal index invariant violated: {reason}")]
    InternalInvariantViolation { reason: String },
}

/// Error returned when loading a configuration file fails.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
