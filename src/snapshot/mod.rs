//! Immutable in-memory index for one documentation build.
//!
//! A snapshot is only ever produced by [`IndexSnapshot::from_parts`], which checks
//! every referential invariant before anything can query it. The loader, the
//! builder and the binary cache all funnel through that single constructor.

pub(crate) mod builder;
pub(crate) mod cache;
pub(crate) mod loader;
pub(crate) mod types;

pub use builder::SnapshotBuilder;
pub use cache::{CacheStatus, CachedSnapshot, SnapshotCache};
pub use loader::{SUPPORTED_ENV_VERSIONS, load, load_file};
pub use types::{DocId, Document, KindInfo, ObjectEntry, ObjectKind, ObjectPriority};

use crate::error::LoadError;
use crate::search::{ObjectIndex, TermIndex};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Plain, unvalidated snapshot contents.
///
/// This is the shape persisted by the binary cache and assembled by the loader;
/// turning it into an [`IndexSnapshot`] re-validates everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotParts {
    pub env_version: u32,
    pub filenames: Vec<String>,
    /// Empty means "use filenames as titles".
    pub titles: Vec<String>,
    pub terms: BTreeMap<String, Vec<DocId>>,
    pub title_terms: BTreeMap<String, Vec<DocId>>,
    pub objects: Vec<ObjectEntry>,
    pub kinds: Vec<KindInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexSnapshot {
    env_version: u32,
    documents: Vec<Document>,
    titles: Vec<String>,
    terms: TermIndex,
    title_terms: TermIndex,
    objects: ObjectIndex,
    kinds: BTreeMap<u32, KindInfo>,
}

impl IndexSnapshot {
    /// Validates `parts` and builds the lookup structures.
    pub fn from_parts(parts: SnapshotParts) -> Result<Self, LoadError> {
        let SnapshotParts {
            env_version,
            filenames,
            titles,
            terms,
            title_terms,
            objects,
            kinds,
        } = parts;

        if !SUPPORTED_ENV_VERSIONS.contains(&env_version) {
            return Err(LoadError::UnsupportedVersion {
                found: env_version.to_string(),
                min: *SUPPORTED_ENV_VERSIONS.start(),
                max: *SUPPORTED_ENV_VERSIONS.end(),
            });
        }

        let document_count = filenames.len();
        if u32::try_from(document_count).is_err() {
            return Err(LoadError::malformed(format!(
                "{} documents exceed the supported maximum",
                document_count
            )));
        }

        let mut seen = AHashSet::with_capacity(document_count);
        for filename in &filenames {
            if !seen.insert(filename.as_str()) {
                return Err(LoadError::malformed(format!(
                    "duplicate filename '{}'",
                    filename
                )));
            }
        }

        let titles = if titles.is_empty() {
            filenames.clone()
        } else if titles.len() == document_count {
            titles
        } else {
            return Err(LoadError::malformed(format!(
                "titles has {} entries but filenames has {}",
                titles.len(),
                document_count
            )));
        };

        let check_posting = |table: &str, term: &str, ids: &[DocId]| {
            match ids.iter().find(|id| id.index() >= document_count) {
                Some(id) => Err(LoadError::malformed(format!(
                    "{} entry '{}' references document {} but only {} documents exist",
                    table, term, id, document_count
                ))),
                None => Ok(()),
            }
        };
        for (term, ids) in &terms {
            check_posting("terms", term, ids)?;
        }
        for (term, ids) in &title_terms {
            check_posting("titleterms", term, ids)?;
        }

        let kinds: BTreeMap<u32, KindInfo> =
            kinds.into_iter().map(|info| (info.code, info)).collect();

        let mut entries = Vec::with_capacity(objects.len());
        for mut entry in objects {
            if entry.document.index() >= document_count {
                return Err(LoadError::malformed(format!(
                    "object '{}' references document {} but only {} documents exist",
                    entry.qualified_name, entry.document, document_count
                )));
            }
            let Some(info) = kinds.get(&entry.kind_code) else {
                return Err(LoadError::malformed(format!(
                    "object '{}' uses unknown kind code {}",
                    entry.qualified_name, entry.kind_code
                )));
            };
            entry.kind = info.kind;
            entries.push(entry);
        }

        let documents = filenames
            .into_iter()
            .enumerate()
            .map(|(idx, filename)| Document {
                id: DocId(idx as u32),
                filename,
            })
            .collect();

        Ok(Self {
            env_version,
            documents,
            titles,
            terms: TermIndex::from_postings(terms),
            title_terms: TermIndex::from_postings(title_terms),
            objects: ObjectIndex::new(entries)?,
            kinds,
        })
    }

    /// Copies the snapshot back into its plain parts.
    pub fn to_parts(&self) -> SnapshotParts {
        SnapshotParts {
            env_version: self.env_version,
            filenames: self.documents.iter().map(|d| d.filename.clone()).collect(),
            titles: self.titles.clone(),
            terms: self.terms.to_postings(),
            title_terms: self.title_terms.to_postings(),
            objects: self.objects.entries().to_vec(),
            kinds: self.kinds.values().cloned().collect(),
        }
    }

    pub fn env_version(&self) -> u32 {
        self.env_version
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.documents.get(id.index())
    }

    pub fn title(&self, id: DocId) -> Option<&str> {
        self.titles.get(id.index()).map(String::as_str)
    }

    pub fn terms(&self) -> &TermIndex {
        &self.terms
    }

    pub fn title_terms(&self) -> &TermIndex {
        &self.title_terms
    }

    pub fn objects(&self) -> &ObjectIndex {
        &self.objects
    }

    pub fn kinds(&self) -> impl Iterator<Item = &KindInfo> {
        self.kinds.values()
    }

    pub fn kind_info(&self, code: u32) -> Option<&KindInfo> {
        self.kinds.get(&code)
    }
}
