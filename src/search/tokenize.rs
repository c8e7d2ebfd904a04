//! Text tokenization and stemming utilities for search indexing.
//!
//! The same [`Tokenizer`] must normalize indexed prose and queries, otherwise
//! query terms stop lining up with index keys.

use crate::config::TokenizerConfig;
use ahash::AHashSet;
use rust_stemmers::{Algorithm, Stemmer};
use std::fmt;

/// A search term in both its folded and stemmed forms.
///
/// Index lookups try both: stemmed indexes match on `stem`, indexes holding raw
/// words match on `word`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedTerm {
    word: String,
    stem: String,
}

impl NormalizedTerm {
    pub fn new(word: impl Into<String>, stem: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            stem: stem.into(),
        }
    }

    /// Lower-cased word as it appeared in the text.
    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Distinct lookup keys, stem first.
    pub fn forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.stem.as_str())
            .chain((self.word != self.stem).then_some(self.word.as_str()))
    }
}

impl fmt::Display for NormalizedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stem)
    }
}

/// A query split into terms that must appear and terms that must not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub included: Vec<NormalizedTerm>,
    /// Terms written with a leading `-`.
    pub excluded: Vec<NormalizedTerm>,
    /// The last included term is still being typed (no trailing whitespace).
    pub open_last_term: bool,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }
}

/// Splits text into normalized search terms.
pub struct Tokenizer {
    min_token_length: usize,
    skip_numeric: bool,
    stop_words: AHashSet<String>,
    /// `None` when stemming is disabled
    stemmer: Option<Stemmer>,
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("min_token_length", &self.min_token_length)
            .field("skip_numeric", &self.skip_numeric)
            .field("stop_words", &self.stop_words.len())
            .field("stemming", &self.stemmer.is_some())
            .finish()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(&TokenizerConfig::default())
    }
}

impl Tokenizer {
    pub fn new(config: &TokenizerConfig) -> Self {
        Self {
            min_token_length: config.min_token_length.max(1),
            skip_numeric: config.skip_numeric,
            stop_words: config
                .stop_words
                .iter()
                .map(|word| word.to_lowercase())
                .collect(),
            stemmer: config
                .stemming
                .then(|| Stemmer::create(Algorithm::English)),
        }
    }

    /// Tokenizes text into unique normalized terms, in order of first appearance.
    pub fn tokenize(&self, text: &str) -> Vec<NormalizedTerm> {
        let mut seen = AHashSet::new();
        split_words(text)
            .filter_map(|word| self.normalize_word(word))
            .filter(|term| seen.insert(term.stem.clone()))
            .collect()
    }

    /// Splits a raw query into included and excluded terms.
    pub fn parse_query(&self, raw: &str) -> ParsedQuery {
        let mut query = ParsedQuery::default();
        let mut seen = AHashSet::new();
        let mut last_chunk_included = false;

        for chunk in raw.split_whitespace() {
            let excluded = chunk.strip_prefix('-').filter(|rest| !rest.is_empty());
            last_chunk_included = false;
            for term in self.tokenize(excluded.unwrap_or(chunk)) {
                if !seen.insert(term.stem.clone()) {
                    continue;
                }
                if excluded.is_some() {
                    query.excluded.push(term);
                } else {
                    query.included.push(term);
                    last_chunk_included = true;
                }
            }
        }

        query.open_last_term = last_chunk_included
            && !raw.is_empty()
            && !raw.ends_with(char::is_whitespace);
        query
    }

    /// Normalizes a single word, returning `None` if it should not be indexed.
    ///
    /// Only case is folded. Diacritics are kept, as in the index keys Sphinx writes.
    fn normalize_word(&self, word: &str) -> Option<NormalizedTerm> {
        if word.chars().count() < self.min_token_length {
            return None;
        }
        if self.skip_numeric && word.chars().all(|c| c.is_numeric()) {
            return None;
        }

        let lowercase = word.to_lowercase();

        // Skip stop words
        if self.stop_words.contains(&lowercase) {
            return None;
        }

        let stem = match &self.stemmer {
            Some(stemmer) => stemmer.stem(&lowercase).into_owned(),
            None => lowercase.clone(),
        };
        Some(NormalizedTerm::new(lowercase, stem))
    }
}

/// Splits text into `\w+` runs: alphanumerics and `_` stay together, so
/// identifiers such as `clamp_input` remain a single word.
fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
}
