//! Turns ranked results into display records and plain-text output.
//!
//! Object hits link to the object's anchor inside its page; prose hits link
//! to the page itself.

use crate::config::OutputConfig;
use crate::search::{MatchSource, ScoredResult, Tier};
use crate::snapshot::{IndexSnapshot, ObjectEntry};
use serde::Serialize;
use std::fmt::{self, Write as _};

/// One search result ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// 1-based position in the result list.
    pub rank: usize,
    pub title: String,
    pub filename: String,
    /// Page URL, including the `#fragment` for object hits.
    pub url: String,
    pub fragment: Option<String>,
    pub tier: Tier,
    pub matched_via: MatchSource,
    pub score: f64,
    /// Qualified name of the matched object, for object hits.
    pub object: Option<String>,
    /// Kind display name, e.g. `Python method`.
    pub kind: Option<String>,
    /// Documented ancestors of the matched object, outermost first.
    pub breadcrumb: Vec<String>,
    /// Short description: `<kind>, in <page title>` for objects.
    pub description: String,
}

/// Anchor for an object inside its page.
///
/// A stored label wins; `-` derives `<kind short name>-<qualified name>`;
/// otherwise the qualified name itself is the anchor.
pub fn fragment(snapshot: &IndexSnapshot, entry: &ObjectEntry) -> String {
    match entry.label.as_deref() {
        Some("-") => {
            let short_name = snapshot
                .kind_info(entry.kind_code)
                .map_or_else(|| entry.kind.as_str(), |info| info.short_name.as_str());
            format!("{}-{}", short_name, entry.qualified_name)
        }
        Some(label) => label.to_string(),
        None => entry.qualified_name.clone(),
    }
}

/// URL of a document page.
pub fn page_url(output: &OutputConfig, filename: &str) -> String {
    format!("{}{}{}", output.base_url, filename, output.file_suffix)
}

/// URL of an object, pointing at its anchor.
pub fn object_url(snapshot: &IndexSnapshot, output: &OutputConfig, entry: &ObjectEntry) -> String {
    let filename = snapshot
        .document(entry.document)
        .map_or("", |doc| doc.filename.as_str());
    format!("{}#{}", page_url(output, filename), fragment(snapshot, entry))
}

/// Display name of an object's kind, falling back to the kind itself.
pub fn kind_label(snapshot: &IndexSnapshot, entry: &ObjectEntry) -> String {
    snapshot
        .kind_info(entry.kind_code)
        .map_or_else(|| entry.kind.to_string(), |info| info.display_name.clone())
}

fn breadcrumb(snapshot: &IndexSnapshot, entry: &ObjectEntry) -> Vec<String> {
    snapshot
        .objects()
        .breadcrumb(entry)
        .into_iter()
        .map(|ancestor| ancestor.qualified_name.clone())
        .collect()
}

/// Builds display records for ranked results.
pub fn build_hits(
    snapshot: &IndexSnapshot,
    results: &[ScoredResult<'_>],
    output: &OutputConfig,
) -> Vec<SearchHit> {
    results
        .iter()
        .enumerate()
        .map(|(idx, result)| {
            let doc = result.document;
            let title = snapshot.title(doc.id).unwrap_or(&doc.filename).to_string();

            match result.matched_entry {
                Some(entry) => {
                    let kind = kind_label(snapshot, entry);
                    SearchHit {
                        rank: idx + 1,
                        description: format!("{}, in {}", kind, title),
                        title,
                        filename: doc.filename.clone(),
                        url: object_url(snapshot, output, entry),
                        fragment: Some(fragment(snapshot, entry)),
                        tier: result.tier,
                        matched_via: result.matched_via,
                        score: result.score,
                        object: Some(entry.qualified_name.clone()),
                        kind: Some(kind),
                        breadcrumb: breadcrumb(snapshot, entry),
                    }
                }
                None => SearchHit {
                    rank: idx + 1,
                    description: format!("Page {}", doc.filename),
                    title,
                    filename: doc.filename.clone(),
                    url: page_url(output, &doc.filename),
                    fragment: None,
                    tier: result.tier,
                    matched_via: result.matched_via,
                    score: result.score,
                    object: None,
                    kind: None,
                    breadcrumb: vec![],
                },
            }
        })
        .collect()
}

/// Renders search hits as a numbered text list.
pub fn render_hits(query: &str, hits: &[SearchHit]) -> String {
    let mut output = String::new();
    write_hits(&mut output, query, hits).expect("writing to String cannot fail");
    output
}

fn write_hits(output: &mut String, query: &str, hits: &[SearchHit]) -> fmt::Result {
    if hits.is_empty() {
        return writeln!(output, "No results found for '{}'.", query);
    }

    writeln!(
        output,
        "Found {} result{} for '{}':",
        hits.len(),
        if hits.len() == 1 { "" } else { "s" },
        query
    )?;

    for hit in hits {
        writeln!(output)?;
        match &hit.object {
            Some(object) => writeln!(output, "{}. {} [{}]", hit.rank, object, hit.tier)?,
            None => writeln!(output, "{}. {} [{}]", hit.rank, hit.title, hit.tier)?,
        }
        writeln!(output, "   {}", hit.description)?;
        if !hit.breadcrumb.is_empty() {
            writeln!(output, "   in {}", hit.breadcrumb.join(" > "))?;
        }
        writeln!(output, "   {}", hit.url)?;
    }
    Ok(())
}

/// Renders exact and suffix resolution of an object name.
pub fn render_lookup(snapshot: &IndexSnapshot, name: &str, output: &OutputConfig) -> String {
    let mut text = String::new();
    write_lookup(&mut text, snapshot, name, output).expect("writing to String cannot fail");
    text
}

fn write_lookup(
    text: &mut String,
    snapshot: &IndexSnapshot,
    name: &str,
    output: &OutputConfig,
) -> fmt::Result {
    let objects = snapshot.objects();
    let exact = objects.resolve_exact(name.trim());
    let suffixes: Vec<&ObjectEntry> = objects
        .resolve_suffix(name)
        .into_iter()
        .filter(|entry| exact.is_none_or(|exact| !std::ptr::eq(*entry, exact)))
        .collect();

    if exact.is_none() && suffixes.is_empty() {
        return writeln!(text, "No object named '{}'.", name);
    }

    if let Some(entry) = exact {
        writeln!(text, "Exact match:")?;
        write_object(text, snapshot, entry, output)?;
    }

    if !suffixes.is_empty() {
        if exact.is_some() {
            writeln!(text)?;
        }
        writeln!(text, "Objects ending in '{}' ({}):", name.trim(), suffixes.len())?;
        for entry in suffixes {
            write_object(text, snapshot, entry, output)?;
        }
    }
    Ok(())
}

fn write_object(
    text: &mut String,
    snapshot: &IndexSnapshot,
    entry: &ObjectEntry,
    output: &OutputConfig,
) -> fmt::Result {
    writeln!(text, "  {} ({})", entry.qualified_name, kind_label(snapshot, entry))?;
    let crumbs = breadcrumb(snapshot, entry);
    if !crumbs.is_empty() {
        writeln!(text, "    in {}", crumbs.join(" > "))?;
    }
    writeln!(text, "    {}", object_url(snapshot, output, entry))
}

/// Renders a summary of a loaded snapshot.
pub fn render_index_info(snapshot: &IndexSnapshot, source: &str) -> String {
    let mut text = String::new();
    write_index_info(&mut text, snapshot, source).expect("writing to String cannot fail");
    text
}

fn write_index_info(text: &mut String, snapshot: &IndexSnapshot, source: &str) -> fmt::Result {
    writeln!(text, "Index: {}", source)?;
    writeln!(text, "envversion: {}", snapshot.env_version())?;
    writeln!(text, "Documents: {}", snapshot.document_count())?;
    writeln!(text, "Terms: {}", snapshot.terms().len())?;
    writeln!(text, "Title terms: {}", snapshot.title_terms().len())?;
    writeln!(text, "Objects: {}", snapshot.objects().len())?;

    let kinds: Vec<_> = snapshot.kinds().collect();
    if !kinds.is_empty() {
        writeln!(text, "\nObject kinds:")?;
        for info in kinds {
            let count = snapshot
                .objects()
                .entries()
                .iter()
                .filter(|entry| entry.kind_code == info.code)
                .count();
            writeln!(
                text,
                "  {:>3}  {}:{}  {} ({})",
                info.code, info.domain, info.short_name, info.display_name, count
            )?;
        }
    }
    Ok(())
}
