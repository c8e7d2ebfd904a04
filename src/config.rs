//! Search configuration loaded from TOML.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below, so an empty file is a valid configuration.

use crate::error::ConfigError;
use crate::snapshot::{ObjectKind, ObjectPriority};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// English stop words dropped from queries and indexed prose.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "near", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with",
];

/// Default number of results returned by a search.
pub const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub tokenizer: TokenizerConfig,
    pub scoring: ScoringWeights,
    pub output: OutputConfig,
    pub cache: CacheConfig,
}

impl SearchConfig {
    /// Reads and validates a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded search config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would break ranking guarantees.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tokenizer.min_token_length == 0 {
            return Err(ConfigError::Invalid(
                "tokenizer.min_token_length must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.scoring.occurrence_weight) {
            return Err(ConfigError::Invalid(format!(
                "scoring.occurrence_weight must be within [0, 1], got {}",
                self.scoring.occurrence_weight
            )));
        }
        if !(0.0..=1.0).contains(&self.scoring.body_share) {
            return Err(ConfigError::Invalid(format!(
                "scoring.body_share must be within [0, 1], got {}",
                self.scoring.body_share
            )));
        }
        let weights = [
            ("exact_match", self.scoring.exact_match),
            ("priority.important", self.scoring.priority.important),
            ("priority.default", self.scoring.priority.default),
            ("priority.unimportant", self.scoring.priority.unimportant),
        ]
        .into_iter()
        .chain(self.scoring.kinds.named());
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "scoring.{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenizerConfig {
    /// Words with fewer characters than this are dropped.
    pub min_token_length: usize,
    pub stop_words: Vec<String>,
    /// Drop words made only of digits.
    pub skip_numeric: bool,
    /// Apply English Snowball stemming.
    pub stemming: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_token_length: 3,
            stop_words: DEFAULT_STOP_WORDS.iter().map(|s| (*s).to_string()).collect(),
            skip_numeric: true,
            stemming: true,
        }
    }
}

/// Weights used by the query engine.
///
/// Tiers always dominate each other; these numbers only order results within a tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringWeights {
    /// Base score of an exact qualified-name match.
    pub exact_match: f64,
    pub kinds: KindWeights,
    pub priority: PriorityFactors,
    /// Scale of the occurrence bonus added to prose coverage, within [0, 1].
    pub occurrence_weight: f64,
    /// Bonus credit of a body-only term hit relative to a title hit, within [0, 1].
    pub body_share: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            exact_match: 100.0,
            kinds: KindWeights::default(),
            priority: PriorityFactors::default(),
            occurrence_weight: 0.5,
            body_share: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KindWeights {
    pub module: f64,
    pub class: f64,
    pub exception: f64,
    pub function: f64,
    pub method: f64,
    pub class_method: f64,
    pub static_method: f64,
    pub attribute: f64,
    pub data: f64,
    pub other: f64,
}

impl Default for KindWeights {
    fn default() -> Self {
        Self {
            module: 15.0,
            class: 12.0,
            exception: 12.0,
            function: 10.0,
            method: 8.0,
            class_method: 8.0,
            static_method: 8.0,
            attribute: 5.0,
            data: 5.0,
            other: 3.0,
        }
    }
}

impl KindWeights {
    pub fn weight(&self, kind: ObjectKind) -> f64 {
        match kind {
            ObjectKind::Module => self.module,
            ObjectKind::Class => self.class,
            ObjectKind::Exception => self.exception,
            ObjectKind::Function => self.function,
            ObjectKind::Method => self.method,
            ObjectKind::ClassMethod => self.class_method,
            ObjectKind::StaticMethod => self.static_method,
            ObjectKind::Attribute => self.attribute,
            ObjectKind::Data => self.data,
            ObjectKind::Other => self.other,
        }
    }

    fn named(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("kinds.module", self.module),
            ("kinds.class", self.class),
            ("kinds.exception", self.exception),
            ("kinds.function", self.function),
            ("kinds.method", self.method),
            ("kinds.class_method", self.class_method),
            ("kinds.static_method", self.static_method),
            ("kinds.attribute", self.attribute),
            ("kinds.data", self.data),
            ("kinds.other", self.other),
        ]
        .into_iter()
    }
}

/// Multipliers applied to object scores by their priority flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriorityFactors {
    pub important: f64,
    pub default: f64,
    pub unimportant: f64,
}

impl Default for PriorityFactors {
    fn default() -> Self {
        Self {
            important: 1.5,
            default: 1.0,
            unimportant: 0.5,
        }
    }
}

impl PriorityFactors {
    pub fn factor(&self, priority: ObjectPriority) -> f64 {
        match priority {
            ObjectPriority::Important => self.important,
            ObjectPriority::Default => self.default,
            ObjectPriority::Unimportant => self.unimportant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Appended to document filenames to build page URLs.
    pub file_suffix: String,
    /// Prefix for page URLs, e.g. `https://docs.example.org/`.
    pub base_url: String,
    pub default_limit: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_suffix: ".html".to_string(),
            base_url: String::new(),
            default_limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Defaults to `<user cache dir>/sphinx-search`.
    pub directory: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
        }
    }
}

impl CacheConfig {
    pub fn resolved_directory(&self) -> Option<PathBuf> {
        self.directory
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("sphinx-search")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SearchConfig::from_toml_str("").unwrap();
        check!(config == SearchConfig::default());
        check!(config.tokenizer.min_token_length == 3);
        check!(config.output.default_limit == DEFAULT_LIMIT);
    }

    #[test]
    fn test_partial_sections_override_only_named_fields() {
        let config = SearchConfig::from_toml_str(
            r#"
[tokenizer]
min_token_length = 2
stemming = false

[scoring.kinds]
method = 20.0

[output]
base_url = "https://docs.example.org/"
"#,
        )
        .unwrap();

        check!(config.tokenizer.min_token_length == 2);
        check!(!config.tokenizer.stemming);
        check!(config.tokenizer.skip_numeric);
        check!(config.scoring.kinds.weight(ObjectKind::Method) == 20.0);
        check!(config.scoring.kinds.weight(ObjectKind::Class) == 12.0);
        check!(config.output.base_url == "https://docs.example.org/");
        check!(config.output.file_suffix == ".html");
    }

    #[rstest]
    #[case("[tokenizer]\nmin_token_length = 0")]
    #[case("[scoring]\noccurrence_weight = 1.5")]
    #[case("[scoring]\nbody_share = -0.1")]
    #[case("[scoring.priority]\nimportant = -1.0")]
    #[case("[scoring.kinds]\nmodule = -3.0")]
    fn test_invalid_values_rejected(#[case] content: &str) {
        let result = SearchConfig::from_toml_str(content);
        check!(let Err(ConfigError::Invalid(_)) = result);
    }

    #[test]
    fn test_unknown_field_is_parse_error() {
        let result = SearchConfig::from_toml_str("[tokenizer]\nminimum = 3");
        check!(let Err(ConfigError::Parse(_)) = result);
    }

    #[test]
    fn test_load_missing_file() {
        let result = SearchConfig::load(Path::new("/nonexistent/sphinx-search.toml"));
        check!(let Err(ConfigError::Read { .. }) = result);
    }
}
