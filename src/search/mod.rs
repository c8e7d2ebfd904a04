//! Search over a loaded documentation snapshot.
//!
//! Tokenization, the prose and object indexes, and the tiered ranking that
//! merges their hits.

pub(crate) mod index;
pub(crate) mod objects;
pub(crate) mod query;
pub(crate) mod scoring;
pub(crate) mod tokenize;

pub use index::TermIndex;
pub use objects::ObjectIndex;
pub use query::{QueryEngine, SearchOptions, search};
pub use scoring::{MatchSource, ScoredResult, Tier};
pub use tokenize::{NormalizedTerm, ParsedQuery, Tokenizer};
