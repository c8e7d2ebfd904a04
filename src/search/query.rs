//! Query engine: tokenizes a query, probes the object and term indexes, and
//! merges the hits into one ranked list.

use super::scoring::{
    ScoredResult, Tier, compare_results, coverage_score, exact_score, suffix_score,
};
use super::tokenize::{NormalizedTerm, ParsedQuery, Tokenizer};
use super::TermIndex;
use crate::config::{DEFAULT_LIMIT, SearchConfig, ScoringWeights};
use crate::error::SearchError;
use crate::snapshot::{DocId, Document, IndexSnapshot, ObjectEntry};
use std::collections::{BTreeMap, BTreeSet};
use std::collections::btree_map::Entry;

/// Per-call search knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub limit: usize,
    /// Treat the last query word as a prefix while it is still being typed.
    pub as_you_type: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            as_you_type: false,
        }
    }
}

impl SearchOptions {
    pub const fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            as_you_type: false,
        }
    }
}

/// Runs searches against any snapshot.
///
/// Holds only configuration, so one engine can serve many snapshots and many
/// concurrent calls. Each call is a pure function of `(snapshot, query, options)`.
#[derive(Debug, Default)]
pub struct QueryEngine {
    tokenizer: Tokenizer,
    weights: ScoringWeights,
}

/// Accumulated score for one document during a search.
#[derive(Debug)]
struct Candidate<'s> {
    tier: Tier,
    score: f64,
    entry: Option<(&'s ObjectEntry, f64)>,
}

impl QueryEngine {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            tokenizer: Tokenizer::new(&config.tokenizer),
            weights: config.scoring.clone(),
        }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Searches `snapshot` for `raw_query`.
    ///
    /// An empty or unmatched query returns an empty list. Errors only signal a
    /// snapshot that references documents it does not contain.
    pub fn search<'s>(
        &self,
        snapshot: &'s IndexSnapshot,
        raw_query: &str,
        options: SearchOptions,
    ) -> Result<Vec<ScoredResult<'s>>, SearchError> {
        let start = std::time::Instant::now();
        let raw = raw_query.trim();
        if raw.is_empty() || options.limit == 0 {
            return Ok(vec![]);
        }

        let mut candidates: BTreeMap<DocId, Candidate<'s>> = BTreeMap::new();

        // Object lookups always run on the untokenized query
        let objects = snapshot.objects();
        let exact = objects.resolve_exact(raw);
        if let Some(entry) = exact {
            let score = exact_score(&self.weights, entry);
            offer(&mut candidates, entry.document, Tier::Exact, score, Some(entry));
        }
        for entry in objects.resolve_suffix(raw) {
            if exact.is_some_and(|exact| std::ptr::eq(exact, entry)) {
                continue;
            }
            let score = suffix_score(&self.weights, entry);
            offer(&mut candidates, entry.document, Tier::Suffix, score, Some(entry));
        }

        // Trailing whitespace closes the last term
        let query = self.tokenizer.parse_query(raw_query.trim_start());
        if !query.is_empty() {
            for (doc, score) in self.score_terms(snapshot, &query, options.as_you_type) {
                offer(&mut candidates, doc, Tier::Term, score, None);
            }
        }

        let mut results = candidates
            .into_iter()
            .map(|(doc, candidate)| {
                Ok(ScoredResult {
                    document: document(snapshot, doc)?,
                    score: candidate.score,
                    tier: candidate.tier,
                    matched_via: candidate.tier.source(),
                    matched_entry: candidate.entry.map(|(entry, _)| entry),
                })
            })
            .collect::<Result<Vec<_>, SearchError>>()?;

        results.sort_by(compare_results);
        let total = results.len();
        results.truncate(options.limit);

        tracing::debug!(
            "Search '{}' matched {} documents ({} terms), returning {} in {:?}",
            raw,
            total,
            query.included.len(),
            results.len(),
            start.elapsed()
        );

        Ok(results)
    }

    /// Computes the prose tier score of every document matching at least one term.
    fn score_terms(
        &self,
        snapshot: &IndexSnapshot,
        query: &ParsedQuery,
        as_you_type: bool,
    ) -> BTreeMap<DocId, f64> {
        let total = query.included.len();
        let last = total - 1;
        // (matched term count, occurrence credit)
        let mut coverage: BTreeMap<DocId, (usize, f64)> = BTreeMap::new();

        for (idx, term) in query.included.iter().enumerate() {
            let prefix = as_you_type && query.open_last_term && idx == last;
            let body = postings(snapshot.terms(), term, prefix);
            let titles = postings(snapshot.title_terms(), term, prefix);

            for doc in body.union(&titles) {
                let credit = if titles.contains(doc) {
                    1.0
                } else {
                    self.weights.body_share
                };
                let slot = coverage.entry(*doc).or_insert((0, 0.0));
                slot.0 += 1;
                slot.1 += credit;
            }
        }

        for term in &query.excluded {
            for doc in postings(snapshot.terms(), term, false)
                .iter()
                .chain(postings(snapshot.title_terms(), term, false).iter())
            {
                coverage.remove(doc);
            }
        }

        coverage
            .into_iter()
            .map(|(doc, (matched, credit))| {
                (doc, coverage_score(&self.weights, matched, credit, total))
            })
            .collect()
    }
}

/// Searches with the default configuration.
pub fn search<'s>(
    snapshot: &'s IndexSnapshot,
    query: &str,
    limit: usize,
) -> Result<Vec<ScoredResult<'s>>, SearchError> {
    QueryEngine::default().search(snapshot, query, SearchOptions::with_limit(limit))
}

fn postings(index: &TermIndex, term: &NormalizedTerm, prefix: bool) -> BTreeSet<DocId> {
    if prefix {
        index.prefix_lookup_term(term)
    } else {
        index.lookup(term)
    }
}

/// Records a contribution. A document keeps its highest tier; contributions
/// within that tier add up.
fn offer<'s>(
    candidates: &mut BTreeMap<DocId, Candidate<'s>>,
    doc: DocId,
    tier: Tier,
    score: f64,
    entry: Option<&'s ObjectEntry>,
) {
    let entry = entry.map(|entry| (entry, score));
    match candidates.entry(doc) {
        Entry::Vacant(slot) => {
            slot.insert(Candidate { tier, score, entry });
        }
        Entry::Occupied(mut slot) => {
            let candidate = slot.get_mut();
            if tier > candidate.tier {
                *candidate = Candidate { tier, score, entry };
            } else if tier == candidate.tier {
                candidate.score += score;
                if let Some((_, new_score)) = entry
                    && candidate.entry.is_none_or(|(_, best)| new_score > best)
                {
                    candidate.entry = entry;
                }
            }
        }
    }
}

fn document(snapshot: &IndexSnapshot, id: DocId) -> Result<&Document, SearchError> {
    snapshot.document(id).ok_or_else(|| {
        let reason = format!(
            "document {} referenced at query time but the snapshot has {} documents",
            id,
            snapshot.document_count()
        );
        tracing::error!("{}", reason);
        SearchError::InternalInvariantViolation { reason }
    })
}
