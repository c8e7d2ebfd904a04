//! Qualified-name lookup over documented API objects.

use crate::error::LoadError;
use crate::snapshot::ObjectEntry;
use ahash::AHashMap;

/// Objects sorted by qualified name, plus a map from the lower-cased last
/// name component to entry positions for suffix queries.
#[derive(Debug, Clone, Default)]
pub struct ObjectIndex {
    entries: Vec<ObjectEntry>,
    by_last_component: AHashMap<String, Vec<usize>>,
}

impl PartialEq for ObjectIndex {
    fn eq(&self, other: &Self) -> bool {
        // The component map is derived from the entries.
        self.entries == other.entries
    }
}

impl ObjectIndex {
    /// Builds the index, rejecting duplicate qualified names.
    pub(crate) fn new(mut entries: Vec<ObjectEntry>) -> Result<Self, LoadError> {
        entries.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));

        if let Some(pair) = entries
            .windows(2)
            .find(|pair| pair[0].qualified_name == pair[1].qualified_name)
        {
            return Err(LoadError::malformed(format!(
                "duplicate object name '{}'",
                pair[0].qualified_name
            )));
        }

        let mut by_last_component: AHashMap<String, Vec<usize>> = AHashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            by_last_component
                .entry(last_component(&entry.qualified_name).to_lowercase())
                .or_default()
                .push(idx);
        }

        Ok(Self {
            entries,
            by_last_component,
        })
    }

    /// Looks up an object by its exact, case-sensitive qualified name.
    pub fn resolve_exact(&self, qualified_name: &str) -> Option<&ObjectEntry> {
        self.entries
            .binary_search_by(|entry| entry.qualified_name.as_str().cmp(qualified_name))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// Finds every object whose qualified name ends with the dotted suffix `partial`.
    ///
    /// Matching is case-insensitive and respects component boundaries, so
    /// `execute` matches `System.execute` but not `System.preexecute`.
    /// Results are ordered by kind, then by qualified name.
    pub fn resolve_suffix(&self, partial: &str) -> Vec<&ObjectEntry> {
        let partial = partial.trim().trim_matches('.').to_lowercase();
        if partial.is_empty() {
            return vec![];
        }

        let Some(candidates) = self.by_last_component.get(last_component(&partial)) else {
            return vec![];
        };

        let dotted = format!(".{}", partial);
        let mut matches: Vec<&ObjectEntry> = candidates
            .iter()
            .map(|&idx| &self.entries[idx])
            .filter(|entry| {
                let name = entry.qualified_name.to_lowercase();
                name == partial || name.ends_with(&dotted)
            })
            .collect();

        matches.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.qualified_name.cmp(&b.qualified_name))
        });
        matches
    }

    /// Finds the nearest documented ancestor of `entry`.
    ///
    /// The container path is walked upwards (`a.b.c`, `a.b`, `a`) until an entry
    /// exists; undocumented intermediate containers are skipped.
    pub fn resolve_container(&self, entry: &ObjectEntry) -> Option<&ObjectEntry> {
        let mut container = entry.container.as_deref()?;
        loop {
            if let Some(found) = self.resolve_exact(container) {
                return Some(found);
            }
            container = container.rsplit_once('.')?.0;
        }
    }

    /// Documented ancestors of `entry`, outermost first.
    pub fn breadcrumb(&self, entry: &ObjectEntry) -> Vec<&ObjectEntry> {
        let mut path = vec![];
        let mut current = self.resolve_container(entry);
        while let Some(ancestor) = current {
            path.push(ancestor);
            current = self.resolve_container(ancestor);
        }
        path.reverse();
        path
    }

    /// All entries, sorted by qualified name.
    pub fn entries(&self) -> &[ObjectEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn last_component(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
