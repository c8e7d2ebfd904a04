//! Record types held by an index snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Document identifier: the position of the document in the index's filename list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One indexed page or section of the documentation set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    /// Path-like key, unique within a snapshot (e.g. `api/System`).
    pub filename: String,
}

/// DO NOT reorder variants - declaration order is the suffix-match ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Module,
    Class,
    Exception,
    Function,
    Method,
    ClassMethod,
    StaticMethod,
    Attribute,
    Data,
    Other,
}

impl ObjectKind {
    /// Maps a kind table short name (`"method"`, `"class"`, ...) to its kind.
    pub fn from_short_name(name: &str) -> Self {
        match name {
            "module" => Self::Module,
            "class" => Self::Class,
            "exception" => Self::Exception,
            "function" => Self::Function,
            "method" => Self::Method,
            "classmethod" => Self::ClassMethod,
            "staticmethod" => Self::StaticMethod,
            "attribute" | "member" => Self::Attribute,
            "data" => Self::Data,
            _ => Self::Other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Class => "class",
            Self::Exception => "exception",
            Self::Function => "function",
            Self::Method => "method",
            Self::ClassMethod => "classmethod",
            Self::StaticMethod => "staticmethod",
            Self::Attribute => "attribute",
            Self::Data => "data",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search priority flag stored with each object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectPriority {
    Important,
    Default,
    Unimportant,
}

impl ObjectPriority {
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Important),
            1 => Some(Self::Default),
            2 => Some(Self::Unimportant),
            _ => None,
        }
    }

    /// Boolean flags mean "searchable by default" (`true`) or "important" (`false`).
    pub const fn from_flag(flag: bool) -> Self {
        if flag { Self::Default } else { Self::Important }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Important => 0,
            Self::Default => 1,
            Self::Unimportant => 2,
        }
    }
}

/// One row of the kind table (`objnames` joined with `objtypes`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindInfo {
    pub code: u32,
    /// Domain the kind belongs to, e.g. `py`.
    pub domain: String,
    pub short_name: String,
    /// Human-readable label, e.g. `Python method`.
    pub display_name: String,
    /// Domain-qualified type name, e.g. `py:method`.
    pub type_name: Option<String>,
    pub kind: ObjectKind,
}

impl KindInfo {
    pub fn new(
        code: u32,
        domain: impl Into<String>,
        short_name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        let short_name = short_name.into();
        Self {
            code,
            domain: domain.into(),
            kind: ObjectKind::from_short_name(&short_name),
            short_name,
            display_name: display_name.into(),
            type_name: None,
        }
    }
}

/// A named API symbol with its defining document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Dotted path, e.g. `Module.Class.method`. Unique within a snapshot.
    pub qualified_name: String,
    /// Last member of the qualified name.
    pub name: String,
    /// Enclosing module or class, `None` for top-level entries.
    pub container: Option<String>,
    pub document: DocId,
    pub kind_code: u32,
    pub kind: ObjectKind,
    pub priority: ObjectPriority,
    /// Anchor/label override. `-` derives `<kind short name>-<qualified name>`.
    pub label: Option<String>,
}

impl ObjectEntry {
    pub fn new(
        container: Option<&str>,
        name: &str,
        document: DocId,
        kind_code: u32,
        priority: ObjectPriority,
        label: Option<String>,
    ) -> Self {
        let container = container.filter(|c| !c.is_empty()).map(str::to_string);
        let qualified_name = match &container {
            Some(container) => format!("{}.{}", container, name),
            None => name.to_string(),
        };
        Self {
            qualified_name,
            name: name.to_string(),
            container,
            document,
            kind_code,
            kind: ObjectKind::Other,
            priority,
            label: label.filter(|l| !l.is_empty()),
        }
    }
}
