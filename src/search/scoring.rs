//! Search relevance and ranking algorithms.
//!
//! Results are ranked in three tiers: exact object name, object name suffix,
//! and prose terms. A higher tier always outranks a lower one; the numeric score
//! only orders results within a tier.

use crate::config::ScoringWeights;
use crate::snapshot::{Document, ObjectEntry};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Priority band of a result. Declaration order is ranking order, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Prose term hits.
    Term,
    /// Object names ending with the query.
    Suffix,
    /// Object name equal to the query.
    Exact,
}

/// Which index produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    Object,
    Term,
}

impl Tier {
    pub const fn source(self) -> MatchSource {
        match self {
            Self::Exact | Self::Suffix => MatchSource::Object,
            Self::Term => MatchSource::Term,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Suffix => "suffix",
            Self::Term => "term",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult<'s> {
    pub document: &'s Document,
    pub score: f64,
    pub tier: Tier,
    pub matched_via: MatchSource,
    /// Best object that placed the document in its tier, for object tiers.
    pub matched_entry: Option<&'s ObjectEntry>,
}

/// Score of an exact qualified-name hit.
pub fn exact_score(weights: &ScoringWeights, entry: &ObjectEntry) -> f64 {
    weights.exact_match * weights.priority.factor(entry.priority)
}

/// Score of a suffix hit: kind weight scaled down by name length, so
/// shallow matches outrank deeply nested ones of the same kind.
pub fn suffix_score(weights: &ScoringWeights, entry: &ObjectEntry) -> f64 {
    let kind_weight = weights.kinds.weight(entry.kind);
    let priority = weights.priority.factor(entry.priority);
    kind_weight * priority / (1.0 + entry.qualified_name.chars().count() as f64)
}

/// Prose coverage score.
///
/// `matched / total` plus an occurrence bonus. `bonus_sum` is the sum of
/// per-term credits, each within [0, 1]. The bonus is scaled by `1 / total²`,
/// so it stays below `1 / total` and a strict superset of matched terms
/// always scores at least as high.
pub fn coverage_score(weights: &ScoringWeights, matched: usize, bonus_sum: f64, total: usize) -> f64 {
    if total == 0 || matched == 0 {
        return 0.0;
    }
    let total = total as f64;
    let occurrence = weights.occurrence_weight.clamp(0.0, 1.0);
    matched as f64 / total + occurrence * (bonus_sum / total) / total
}

/// Deterministic result ordering.
///
/// Higher tier first, then higher score, then shorter filename (in
/// characters), then lexicographic filename, then document id.
pub fn compare_results(a: &ScoredResult<'_>, b: &ScoredResult<'_>) -> Ordering {
    b.tier
        .cmp(&a.tier)
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| {
            let a_len = a.document.filename.chars().count();
            a_len.cmp(&b.document.filename.chars().count())
        })
        .then_with(|| a.document.filename.cmp(&b.document.filename))
        .then_with(|| a.document.id.cmp(&b.document.id))
}
