//! Programmatic snapshot construction.

use super::{DocId, IndexSnapshot, KindInfo, ObjectEntry, ObjectPriority, SnapshotParts};
use crate::error::LoadError;
use crate::search::Tokenizer;

/// Envversion stamped on snapshots built in memory.
pub const DEFAULT_ENV_VERSION: u32 = 50;

/// Builder for assembling a snapshot without going through the file format.
///
/// Prose is indexed with a [`Tokenizer`], so terms are normalized exactly as
/// queries will be. Validation happens once, in [`SnapshotBuilder::build`].
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    parts: SnapshotParts,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            parts: SnapshotParts {
                env_version: DEFAULT_ENV_VERSION,
                ..SnapshotParts::default()
            },
        }
    }

    pub fn env_version(&mut self, version: u32) -> &mut Self {
        self.parts.env_version = version;
        self
    }

    /// Adds a document and returns its id.
    pub fn document(&mut self, filename: impl Into<String>, title: impl Into<String>) -> DocId {
        let id = DocId(self.parts.filenames.len() as u32);
        self.parts.filenames.push(filename.into());
        self.parts.titles.push(title.into());
        id
    }

    /// Adds a raw, already-normalized term posting.
    pub fn term(&mut self, term: impl Into<String>, doc: DocId) -> &mut Self {
        self.parts.terms.entry(term.into()).or_default().push(doc);
        self
    }

    pub fn title_term(&mut self, term: impl Into<String>, doc: DocId) -> &mut Self {
        self.parts.title_terms.entry(term.into()).or_default().push(doc);
        self
    }

    /// Tokenizes `text` and posts every stem for `doc`.
    pub fn index_text(&mut self, tokenizer: &Tokenizer, doc: DocId, text: &str) -> &mut Self {
        for term in tokenizer.tokenize(text) {
            self.term(term.stem(), doc);
        }
        self
    }

    /// Tokenizes `text` into title terms for `doc`.
    pub fn index_title(&mut self, tokenizer: &Tokenizer, doc: DocId, text: &str) -> &mut Self {
        for term in tokenizer.tokenize(text) {
            self.title_term(term.stem(), doc);
        }
        self
    }

    pub fn kind(&mut self, info: KindInfo) -> &mut Self {
        self.parts.kinds.retain(|existing| existing.code != info.code);
        self.parts.kinds.push(info);
        self
    }

    /// Adds an object entry. `container` of `None` or `""` means top level.
    pub fn object(
        &mut self,
        container: Option<&str>,
        name: &str,
        doc: DocId,
        kind_code: u32,
        priority: ObjectPriority,
        label: Option<&str>,
    ) -> &mut Self {
        self.parts.objects.push(ObjectEntry::new(
            container,
            name,
            doc,
            kind_code,
            priority,
            label.map(str::to_string),
        ));
        self
    }

    pub fn build(self) -> Result<IndexSnapshot, LoadError> {
        IndexSnapshot::from_parts(self.parts)
    }
}
