//! Parsing of the persisted search index format.
//!
//! The payload is deserialized into loosely-typed `Raw*` structs that mirror the
//! file exactly, then converted into [`SnapshotParts`] and validated. Nothing
//! downstream ever sees the compact encodings (bare-integer postings, boolean
//! priority flags, string kind codes).

use super::{DocId, IndexSnapshot, KindInfo, ObjectEntry, ObjectPriority, SnapshotParts};
use crate::error::LoadError;
use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::LazyLock;

/// Index envversions this engine understands.
pub const SUPPORTED_ENV_VERSIONS: RangeInclusive<u32> = 42..=60;

/// Prefix of the JavaScript wrapper emitted around the index payload.
const JS_WRAPPER_PREFIX: &str = "Search.setIndex(";

/// Matches either a complete string literal or an unquoted object key.
///
/// String literals are matched first so keys are never rewritten inside them.
static UNQUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)(\s*:)"#)
        .expect("unquoted key pattern is valid")
});

#[derive(Debug, Deserialize)]
struct RawIndex {
    filenames: Vec<String>,
    #[serde(default)]
    titles: Option<Vec<String>>,
    terms: BTreeMap<String, RawPosting>,
    #[serde(default)]
    titleterms: Option<BTreeMap<String, RawPosting>>,
    objects: BTreeMap<String, BTreeMap<String, RawObject>>,
    #[serde(default)]
    objnames: BTreeMap<String, (String, String, String)>,
    #[serde(default)]
    objtypes: BTreeMap<String, String>,
}

/// A bare integer is a single-document posting.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPosting {
    Single(u32),
    Many(Vec<u32>),
}

impl RawPosting {
    fn into_ids(self) -> Vec<DocId> {
        match self {
            Self::Single(id) => vec![DocId(id)],
            Self::Many(ids) => ids.into_iter().map(DocId).collect(),
        }
    }
}

/// `[DocId, kindCode, priorityFlag, labelOrEmpty]`
#[derive(Debug, Deserialize)]
struct RawObject(u32, RawCode, RawPriority, String);

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCode {
    Int(u32),
    Str(String),
}

impl RawCode {
    fn parse(&self) -> Result<u32, LoadError> {
        match self {
            Self::Int(code) => Ok(*code),
            Self::Str(code) => code
                .parse()
                .map_err(|_| LoadError::malformed(format!("invalid kind code '{}'", code))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPriority {
    Code(u8),
    Flag(bool),
}

impl RawPriority {
    fn parse(&self) -> Result<ObjectPriority, LoadError> {
        match self {
            Self::Code(code) => ObjectPriority::from_code(*code)
                .ok_or_else(|| LoadError::malformed(format!("invalid priority flag {}", code))),
            Self::Flag(flag) => Ok(ObjectPriority::from_flag(*flag)),
        }
    }
}

/// Parses a search index payload into a validated snapshot.
///
/// Accepts plain JSON or the `Search.setIndex({...})` JavaScript form.
pub fn load(bytes: &[u8]) -> Result<IndexSnapshot, LoadError> {
    let start = std::time::Instant::now();
    let text = std::str::from_utf8(bytes)
        .map_err(|e| LoadError::malformed(format!("index is not valid UTF-8: {}", e)))?;
    let payload = extract_payload(text);

    let value: Value = serde_json::from_str(&payload)
        .map_err(|e| LoadError::malformed(format!("index is not a valid object literal: {}", e)))?;
    let env_version = check_version(&value)?;

    let raw = RawIndex::deserialize(value)
        .map_err(|e| LoadError::malformed(e.to_string()))?;
    let snapshot = IndexSnapshot::from_parts(raw.into_parts(env_version)?)?;

    tracing::info!(
        "Loaded search index: {} documents, {} terms, {} title terms, {} objects in {:?}",
        snapshot.document_count(),
        snapshot.terms().len(),
        snapshot.title_terms().len(),
        snapshot.objects().len(),
        start.elapsed()
    );

    Ok(snapshot)
}

/// Reads and parses a search index file.
pub fn load_file(path: &Path) -> Result<IndexSnapshot, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load(&bytes)
}

/// Strips the JavaScript wrapper and quotes bare object keys, if present.
fn extract_payload(text: &str) -> Cow<'_, str> {
    let trimmed = text.trim().trim_start_matches('\u{feff}');
    let Some(inner) = trimmed.strip_prefix(JS_WRAPPER_PREFIX) else {
        return Cow::Borrowed(trimmed);
    };
    let inner = inner.trim_end().trim_end_matches(';').trim_end();
    let inner = inner.strip_suffix(')').unwrap_or(inner);

    UNQUOTED_KEY.replace_all(inner, |caps: &Captures<'_>| match (caps.get(1), caps.get(2), caps.get(3)) {
        (Some(open), Some(key), Some(colon)) => {
            format!("{}\"{}\"{}", open.as_str(), key.as_str(), colon.as_str())
        }
        _ => caps[0].to_string(),
    })
}

fn check_version(value: &Value) -> Result<u32, LoadError> {
    let unsupported = |found: String| LoadError::UnsupportedVersion {
        found,
        min: *SUPPORTED_ENV_VERSIONS.start(),
        max: *SUPPORTED_ENV_VERSIONS.end(),
    };

    let Some(object) = value.as_object() else {
        return Err(LoadError::malformed("index payload is not an object"));
    };
    let Some(version) = object.get("envversion") else {
        return Err(LoadError::malformed("missing field `envversion`"));
    };

    match version.as_u64().and_then(|v| u32::try_from(v).ok()) {
        Some(v) if SUPPORTED_ENV_VERSIONS.contains(&v) => Ok(v),
        _ => Err(unsupported(version.to_string())),
    }
}

impl RawIndex {
    fn into_parts(self, env_version: u32) -> Result<SnapshotParts, LoadError> {
        let kinds = self
            .objnames
            .iter()
            .map(|(code, (domain, short_name, display_name))| -> Result<KindInfo, LoadError> {
                let code = RawCode::Str(code.clone()).parse()?;
                let mut info = KindInfo::new(code, domain, short_name, display_name);
                info.type_name = self.objtypes.get(&code.to_string()).cloned();
                Ok(info)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut objects = Vec::new();
        for (container, members) in self.objects {
            for (name, RawObject(doc, code, priority, label)) in members {
                objects.push(ObjectEntry::new(
                    Some(container.as_str()),
                    &name,
                    DocId(doc),
                    code.parse()?,
                    priority.parse()?,
                    Some(label),
                ));
            }
        }

        Ok(SnapshotParts {
            env_version,
            filenames: self.filenames,
            titles: self.titles.unwrap_or_default(),
            terms: normalize_postings(self.terms),
            title_terms: normalize_postings(self.titleterms.unwrap_or_default()),
            objects,
            kinds,
        })
    }
}

fn normalize_postings(raw: BTreeMap<String, RawPosting>) -> BTreeMap<String, Vec<DocId>> {
    raw.into_iter()
        .map(|(term, posting)| (term, posting.into_ids()))
        .collect()
}

impl IndexSnapshot {
    /// Serializes the snapshot back into the persisted index format.
    ///
    /// Single-document postings use the bare-integer encoding, and objects
    /// are grouped by container, so `load` of the output yields an equal snapshot.
    pub fn to_index_json(&self) -> Value {
        let postings = |index: &crate::search::TermIndex| -> Map<String, Value> {
            index
                .iter()
                .map(|(term, ids)| {
                    let value = match ids {
                        [single] => json!(single.0),
                        many => json!(many.iter().map(|id| id.0).collect::<Vec<_>>()),
                    };
                    (term.to_string(), value)
                })
                .collect()
        };

        let mut objects: BTreeMap<&str, Map<String, Value>> = BTreeMap::new();
        for entry in self.objects().entries() {
            objects.entry(entry.container.as_deref().unwrap_or("")).or_default().insert(
                entry.name.clone(),
                json!([
                    entry.document.0,
                    entry.kind_code,
                    entry.priority.code(),
                    entry.label.as_deref().unwrap_or("")
                ]),
            );
        }

        let objnames: Map<String, Value> = self
            .kinds()
            .map(|info| {
                (
                    info.code.to_string(),
                    json!([info.domain, info.short_name, info.display_name]),
                )
            })
            .collect();
        let objtypes: Map<String, Value> = self
            .kinds()
            .filter_map(|info| {
                info.type_name
                    .as_ref()
                    .map(|name| (info.code.to_string(), json!(name)))
            })
            .collect();

        json!({
            "envversion": self.env_version(),
            "filenames": self.documents().iter().map(|d| d.filename.as_str()).collect::<Vec<_>>(),
            "titles": self.documents().iter().filter_map(|d| self.title(d.id)).collect::<Vec<_>>(),
            "terms": postings(self.terms()),
            "titleterms": postings(self.title_terms()),
            "objects": objects,
            "objnames": objnames,
            "objtypes": objtypes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ObjectKind;
    use assert2::check;
    use rstest::rstest;

    const WRAPPED: &str = r#"Search.setIndex({envversion:50,filenames:["api","guide"],objects:{"":{api:[0,0,0,"-"]},"api.Engine":{"run":[0,1,1,""],__init__:[0,1,2,""]}},objnames:{"0":["py","module","Python module"],"1":["py","method","Python method"]},objtypes:{"0":"py:module","1":"py:method"},terms:{"run":[0,1],engin:0,"note: a,b:c":1},titles:["API, reference: {all}","Guide"],titleterms:{guid:1}})"#;

    #[test]
    fn test_load_js_wrapper() {
        let snapshot = load(WRAPPED.as_bytes()).unwrap();
        check!(snapshot.env_version() == 50);
        check!(snapshot.document_count() == 2);
        check!(snapshot.title(DocId(0)) == Some("API, reference: {all}"));
        check!(snapshot.terms().lookup_key("engin") == [DocId(0)]);
        check!(snapshot.terms().lookup_key("note: a,b:c") == [DocId(1)]);
        check!(snapshot.title_terms().lookup_key("guid") == [DocId(1)]);

        let module = snapshot.objects().resolve_exact("api").unwrap();
        check!(module.kind == ObjectKind::Module);
        check!(module.label.as_deref() == Some("-"));
        check!(module.container.is_none());

        let init = snapshot.objects().resolve_exact("api.Engine.__init__").unwrap();
        check!(init.priority == ObjectPriority::Unimportant);
        check!(init.label.is_none());

        let info = snapshot.kind_info(1).unwrap();
        check!(info.type_name.as_deref() == Some("py:method"));
        check!(info.display_name == "Python method");
    }

    #[test]
    fn test_load_plain_json_with_trailing_semicolon_wrapper() {
        let wrapped = format!("{};\n", WRAPPED);
        check!(load(wrapped.as_bytes()).is_ok());

        let json = r#"{"envversion": 51, "filenames": ["a"], "terms": {"x": 0}, "objects": {}}"#;
        let snapshot = load(json.as_bytes()).unwrap();
        check!(snapshot.title(DocId(0)) == Some("a"));
        check!(snapshot.title_terms().is_empty());
    }

    #[test]
    fn test_bool_priority_and_string_codes() {
        let json = r#"{"envversion": 50, "filenames": ["a", "b"], "terms": {},
            "objects": {"Cache": {"evict": [1, "0", true, ""]}},
            "objnames": {"0": ["py", "method", "Python method"]}}"#;
        let snapshot = load(json.as_bytes()).unwrap();
        let entry = snapshot.objects().resolve_exact("Cache.evict").unwrap();
        check!(entry.document == DocId(1));
        check!(entry.priority == ObjectPriority::Default);
    }

    #[rstest]
    #[case::dangling_term(r#"{"envversion": 50, "filenames": ["a"], "terms": {"x": [0, 1]}, "objects": {}}"#)]
    #[case::dangling_object(r#"{"envversion": 50, "filenames": ["a"], "terms": {}, "objects": {"": {"m": [3, 0, 0, ""]}}, "objnames": {"0": ["py", "module", "Python module"]}}"#)]
    #[case::unknown_kind(r#"{"envversion": 50, "filenames": ["a"], "terms": {}, "objects": {"": {"m": [0, 4, 0, ""]}}}"#)]
    #[case::missing_terms(r#"{"envversion": 50, "filenames": ["a"], "objects": {}}"#)]
    #[case::missing_version(r#"{"filenames": ["a"], "terms": {}, "objects": {}}"#)]
    #[case::bad_posting(r#"{"envversion": 50, "filenames": ["a"], "terms": {"x": "zero"}, "objects": {}}"#)]
    #[case::negative_id(r#"{"envversion": 50, "filenames": ["a"], "terms": {"x": -1}, "objects": {}}"#)]
    #[case::bad_priority(r#"{"envversion": 50, "filenames": ["a"], "terms": {}, "objects": {"": {"m": [0, 0, 5, ""]}}, "objnames": {"0": ["py", "module", "Python module"]}}"#)]
    #[case::title_mismatch(r#"{"envversion": 50, "filenames": ["a"], "titles": [], "terms": {}, "objects": {}}"#)]
    #[case::not_an_object(r#"[1, 2, 3]"#)]
    #[case::garbage("Search.setIndex(")]
    fn test_malformed_rejected(#[case] payload: &str) {
        let result = load(payload.as_bytes());
        check!(let Err(LoadError::MalformedIndex { .. }) = result);
    }

    #[rstest]
    #[case("12")]
    #[case("999")]
    #[case(r#"{"sphinx": 56}"#)]
    #[case(r#""50""#)]
    fn test_unsupported_version(#[case] version: &str) {
        let payload = format!(
            r#"{{"envversion": {}, "filenames": [], "terms": {{}}, "objects": {{}}}}"#,
            version
        );
        let result = load(payload.as_bytes());
        check!(let Err(LoadError::UnsupportedVersion { .. }) = result);
    }

    #[test]
    fn test_round_trip_through_index_json() {
        let snapshot = load(WRAPPED.as_bytes()).unwrap();
        let serialized = serde_json::to_vec(&snapshot.to_index_json()).unwrap();
        let reloaded = load(&serialized).unwrap();
        check!(snapshot == reloaded);
    }

    #[test]
    fn test_load_file_missing() {
        let result = load_file(Path::new("/nonexistent/searchindex.js"));
        check!(let Err(LoadError::Io { .. }) = result);
    }
}
