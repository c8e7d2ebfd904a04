//! Inverted term index for prose search.

use super::tokenize::NormalizedTerm;
use crate::snapshot::DocId;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// Map from normalized term to the sorted, de-duplicated documents containing it.
///
/// Keys are kept in a `BTreeMap` so prefix lookups are a range scan instead of a
/// pass over every term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermIndex {
    postings: BTreeMap<String, Vec<DocId>>,
}

impl TermIndex {
    /// Builds the index, sorting and de-duplicating each posting list.
    pub(crate) fn from_postings(postings: BTreeMap<String, Vec<DocId>>) -> Self {
        let postings = postings
            .into_iter()
            .filter_map(|(term, mut ids)| {
                ids.sort_unstable();
                ids.dedup();
                (!ids.is_empty()).then_some((term, ids))
            })
            .collect();
        Self { postings }
    }

    pub(crate) fn to_postings(&self) -> BTreeMap<String, Vec<DocId>> {
        self.postings.clone()
    }

    /// Documents containing `term` in any of its normalized forms.
    pub fn lookup(&self, term: &NormalizedTerm) -> BTreeSet<DocId> {
        term.forms()
            .flat_map(|form| self.lookup_key(form).iter().copied())
            .collect()
    }

    /// Raw posting list for an exact key.
    pub fn lookup_key(&self, key: &str) -> &[DocId] {
        self.postings.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Union of the postings of every term starting with `prefix`.
    ///
    /// An empty prefix matches nothing.
    pub fn prefix_lookup(&self, prefix: &str) -> BTreeSet<DocId> {
        if prefix.is_empty() {
            return BTreeSet::new();
        }
        self.postings
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Prefix lookup over every normalized form of `term`.
    pub fn prefix_lookup_term(&self, term: &NormalizedTerm) -> BTreeSet<DocId> {
        term.forms()
            .flat_map(|form| self.prefix_lookup(form))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DocId])> {
        self.postings
            .iter()
            .map(|(term, ids)| (term.as_str(), ids.as_slice()))
    }

    /// Get the number of unique terms in the index
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}
