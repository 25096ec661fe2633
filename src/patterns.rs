//! Pattern registry loader and validation.
//!
//! Loads the label → rule mapping from YAML and checks every rule up front,
//! so a malformed pattern file fails before any file is touched.

use crate::document::ValueShape;
use crate::handlers::{HandlerError, HandlerRegistry, ValueSpec};
use crate::matcher::TokenPattern;
use indexmap::IndexMap;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for pattern configuration problems
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        message: String,
    },
    Parse(String),
    UnsupportedIndex {
        label: String,
        field: &'static str,
        index: TokenIndex,
    },
    Handler {
        label: String,
        source: HandlerError,
    },
    ShapeMismatch {
        label: String,
        input: ValueShape,
        expected: ValueShape,
    },
    Invalid {
        label: String,
        message: String,
    },
    InvalidMatchPattern {
        label: String,
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "Failed to read patterns file {}: {}", path.display(), message)
            }
            ConfigError::Parse(msg) => write!(f, "Failed to parse patterns: {}", msg),
            ConfigError::UnsupportedIndex { label, field, index } => write!(
                f,
                "{}: index keyword '{}' is not supported for '{}'",
                label, index, field
            ),
            ConfigError::Handler { label, source } => write!(f, "{}: {}", label, source),
            ConfigError::ShapeMismatch {
                label,
                input,
                expected,
            } => write!(
                f,
                "{}: input rule produces a {} value but the output rule expects a {}",
                label, input, expected
            ),
            ConfigError::Invalid { label, message } => write!(f, "{}: {}", label, message),
            ConfigError::InvalidMatchPattern { label, message } => {
                write!(f, "{}: invalid match pattern: {}", label, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Token position in an input rule: a keyword or an integer offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawIndex")]
pub enum TokenIndex {
    /// The span's first token
    Start,
    /// The span's last token
    End,
    Offset(i64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIndex {
    Offset(i64),
    Keyword(String),
}

impl TryFrom<RawIndex> for TokenIndex {
    type Error = String;

    fn try_from(raw: RawIndex) -> Result<Self, Self::Error> {
        match raw {
            RawIndex::Offset(n) => Ok(TokenIndex::Offset(n)),
            RawIndex::Keyword(k) if k == "start" => Ok(TokenIndex::Start),
            RawIndex::Keyword(k) if k == "end" => Ok(TokenIndex::End),
            RawIndex::Keyword(k) => Err(format!("index keyword {} is not supported", k)),
        }
    }
}

impl fmt::Display for TokenIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenIndex::Start => write!(f, "start"),
            TokenIndex::End => write!(f, "end"),
            TokenIndex::Offset(n) => write!(f, "{}", n),
        }
    }
}

/// How raw value(s) are pulled out of a matched span
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputRule {
    /// One token: `start`, `end` or an absolute doc position
    Single { index: TokenIndex },
    /// The span's full surface text
    All,
    /// Selected tokens; integers are relative to the span
    Distinct { indexes: Vec<TokenIndex> },
    /// A token range; both offsets count from the span start
    Multi {
        #[serde(default)]
        start: Option<TokenIndex>,
        #[serde(default)]
        end: Option<TokenIndex>,
    },
}

impl InputRule {
    pub fn shape(&self) -> ValueShape {
        match self {
            InputRule::Single { .. } | InputRule::All => ValueShape::Scalar,
            InputRule::Distinct { .. } | InputRule::Multi { .. } => ValueShape::List,
        }
    }
}

/// One named output field
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputSpec {
    /// Field name written into the field mapping
    pub index: String,
    #[serde(flatten)]
    pub value: ValueSpec,
    /// Keys that are neither `index` nor part of the value spec
    #[serde(flatten)]
    pub(crate) unknown: BTreeMap<String, IgnoredAny>,
}

/// How a raw value becomes named output fields
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputRule {
    Single(OutputSpec),
    Multi { outputs: Vec<OutputSpec> },
}

/// Match spec plus input and output rules for one label
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PatternRule {
    /// Alternatives handed to the entity resolver; each is a token sequence
    pub patterns: Vec<Vec<TokenPattern>>,
    pub input: InputRule,
    pub output: OutputRule,
}

/// Validated label → rule mapping, in file order.
///
/// Built once at startup and shared by reference for the rest of the run.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    rules: IndexMap<String, PatternRule>,
}

impl PatternRegistry {
    /// Load and validate patterns from a YAML (or JSON) file.
    ///
    /// # Arguments
    /// * `path` - Path to patterns.yaml
    /// * `handlers` - Handler registry used to check handler names and args
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the file cannot be read, is not valid
    /// YAML, or any rule fails validation.
    ///
    /// # Example
    /// ```ignore
    /// use multirename::{HandlerRegistry, PatternRegistry};
    ///
    /// let handlers = HandlerRegistry::builtin();
    /// let patterns = PatternRegistry::load_from_file("patterns.yaml", &handlers)?;
    /// println!("Labels: {:?}", patterns.labels());
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(
        path: P,
        handlers: &HandlerRegistry,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::from_yaml_str(&contents, handlers)
    }

    /// Parse and validate patterns from a YAML string.
    pub fn from_yaml_str(yaml: &str, handlers: &HandlerRegistry) -> Result<Self, ConfigError> {
        let rules: IndexMap<String, PatternRule> =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Self::from_rules(rules, handlers)
    }

    /// Build a registry from rules constructed in code.
    pub fn from_rules(
        rules: IndexMap<String, PatternRule>,
        handlers: &HandlerRegistry,
    ) -> Result<Self, ConfigError> {
        for (label, rule) in &rules {
            validate_rule(label, rule, handlers)?;
        }

        Ok(Self { rules })
    }

    pub fn get(&self, label: &str) -> Option<&PatternRule> {
        self.rules.get(label)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.rules.contains_key(label)
    }

    /// Labels in file order
    pub fn labels(&self) -> Vec<&str> {
        self.rules.keys().map(|k| k.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PatternRule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Check one rule: index keywords, handler names and arguments, and that the
/// value shape produced by the input rule is what the output rule consumes.
fn validate_rule(
    label: &str,
    rule: &PatternRule,
    handlers: &HandlerRegistry,
) -> Result<(), ConfigError> {
    if let InputRule::Multi { start, end } = &rule.input {
        if let Some(index @ TokenIndex::End) = start {
            return Err(ConfigError::UnsupportedIndex {
                label: label.to_string(),
                field: "start",
                index: *index,
            });
        }
        if let Some(index @ TokenIndex::Start) = end {
            return Err(ConfigError::UnsupportedIndex {
                label: label.to_string(),
                field: "end",
                index: *index,
            });
        }
    }

    let handler_error = |source: HandlerError| ConfigError::Handler {
        label: label.to_string(),
        source,
    };
    let input = rule.input.shape();

    match &rule.output {
        OutputRule::Single(spec) => {
            check_field_name(label, spec)?;
            let expected = handlers
                .validate_spec(&spec.value)
                .map_err(handler_error)?
                .unwrap_or(ValueShape::Scalar);
            if expected != input {
                return Err(ConfigError::ShapeMismatch {
                    label: label.to_string(),
                    input,
                    expected,
                });
            }
        }
        OutputRule::Multi { outputs } => {
            if outputs.is_empty() {
                return Err(ConfigError::Invalid {
                    label: label.to_string(),
                    message: "outputs is mandatory for multi output type".to_string(),
                });
            }
            for spec in outputs {
                check_field_name(label, spec)?;
                if let Some(expected) = handlers.validate_spec(&spec.value).map_err(handler_error)? {
                    if expected != ValueShape::Scalar {
                        return Err(ConfigError::ShapeMismatch {
                            label: label.to_string(),
                            input: ValueShape::Scalar,
                            expected,
                        });
                    }
                }
            }
            if let InputRule::Distinct { indexes } = &rule.input {
                if indexes.len() != outputs.len() {
                    return Err(ConfigError::Invalid {
                        label: label.to_string(),
                        message: format!(
                            "multi output handling: count of values ({}) and outputs ({}) do not match",
                            indexes.len(),
                            outputs.len()
                        ),
                    });
                }
            }
        }
    }

    Ok(())
}

fn check_field_name(label: &str, spec: &OutputSpec) -> Result<(), ConfigError> {
    if spec.index.trim().is_empty() {
        return Err(ConfigError::Invalid {
            label: label.to_string(),
            message: "output index must be a non-empty field name".to_string(),
        });
    }
    if let Some(key) = spec.unknown.keys().next() {
        return Err(ConfigError::Invalid {
            label: label.to_string(),
            message: format!("unknown key '{}' in output spec", key),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(yaml: &str) -> Result<PatternRegistry, ConfigError> {
        PatternRegistry::from_yaml_str(yaml, &HandlerRegistry::builtin())
    }

    const VALID: &str = r#"
VOLUME:
  patterns:
    - - LOWER: vol
      - TEXT: { REGEX: "^[IVXLCDM]+$" }
  input: { type: single, index: end }
  output: { type: single, index: volume, handler: numeral }
NUMBER:
  patterns:
    - - LOWER: { IN: [no, nos] }
      - IS_DIGIT: true
  input: { type: distinct, indexes: [end] }
  output:
    type: multi
    outputs:
      - index: number
DATE:
  patterns:
    - - IS_ALPHA: true
      - IS_DIGIT: true
  input: { type: all }
  output: { type: single, index: date, handler: date, args: { format: "%Y-%m" } }
"#;

    #[test]
    fn test_load_valid_patterns() {
        let registry = load(VALID).unwrap();

        assert_eq!(registry.labels(), vec!["VOLUME", "NUMBER", "DATE"]);
        assert!(registry.has_label("DATE"));
        assert!(!registry.has_label("TITLE"));

        let volume = registry.get("VOLUME").unwrap();
        assert_eq!(volume.input, InputRule::Single { index: TokenIndex::End });
        match &volume.output {
            OutputRule::Single(spec) => {
                assert_eq!(spec.index, "volume");
                assert_eq!(spec.value.handler.as_deref(), Some("numeral"));
            }
            other => panic!("unexpected output rule {:?}", other),
        }
    }

    #[test]
    fn test_multi_defaults() {
        let registry = load(
            r#"
RANGE:
  patterns: [[{ IS_DIGIT: true }]]
  input: { type: multi, start: 1 }
  output: { type: multi, outputs: [{ index: a }] }
"#,
        )
        .unwrap();

        assert_eq!(
            registry.get("RANGE").unwrap().input,
            InputRule::Multi {
                start: Some(TokenIndex::Offset(1)),
                end: None
            }
        );
    }

    #[test]
    fn test_unknown_input_type() {
        let err = load(
            r#"
X:
  patterns: [[{ IS_DIGIT: true }]]
  input: { type: every }
  output: { type: single, index: x }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_index_field() {
        let err = load(
            r#"
X:
  patterns: [[{ IS_DIGIT: true }]]
  input: { type: single }
  output: { type: single, index: x }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("index"));
    }

    #[test]
    fn test_unsupported_keyword() {
        let err = load(
            r#"
X:
  patterns: [[{ IS_DIGIT: true }]]
  input: { type: distinct, indexes: [start, middle] }
  output: { type: multi, outputs: [{ index: a }, { index: b }] }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("index keyword middle is not supported"));
    }

    #[test]
    fn test_multi_start_cannot_be_end() {
        let err = load(
            r#"
X:
  patterns: [[{ IS_DIGIT: true }]]
  input: { type: multi, start: end }
  output: { type: multi, outputs: [{ index: a }] }
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedIndex { field: "start", .. }
        ));
    }

    #[test]
    fn test_misspelled_output_key_fails_at_load() {
        let err = load(
            r#"
X:
  patterns: [[{ IS_DIGIT: true }]]
  input: { type: single, index: end }
  output: { type: single, index: x, hanlder: numeral }
"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                label: "X".to_string(),
                message: "unknown key 'hanlder' in output spec".to_string(),
            }
        );

        let err = load(
            r#"
X:
  patterns: [[{ IS_DIGIT: true }]]
  input: { type: distinct, indexes: [start, end] }
  output: { type: multi, outputs: [{ index: a }, { index: b, arg: {} }] }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown key 'arg'"));
    }

    #[test]
    fn test_unknown_handler_fails_at_load() {
        let err = load(
            r#"
X:
  patterns: [[{ IS_DIGIT: true }]]
  input: { type: all }
  output: { type: single, index: x, handler: shout }
"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Handler {
                label: "X".to_string(),
                source: HandlerError::NotFound("shout".to_string()),
            }
        );
    }

    #[test]
    fn test_shape_mismatch_list_into_scalar_output() {
        let err = load(
            r#"
X:
  patterns: [[{ IS_DIGIT: true }]]
  input: { type: distinct, indexes: [start] }
  output: { type: single, index: x }
"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::ShapeMismatch {
                label: "X".to_string(),
                input: ValueShape::List,
                expected: ValueShape::Scalar,
            }
        );
    }

    #[test]
    fn test_shape_mismatch_scalar_into_joiner() {
        let err = load(
            r#"
X:
  patterns: [[{ IS_DIGIT: true }]]
  input: { type: all }
  output: { type: single, index: x, handler: joiner, args: { separator: "-" } }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_distinct_multi_count_mismatch() {
        let err = load(
            r#"
X:
  patterns: [[{ IS_DIGIT: true }]]
  input: { type: distinct, indexes: [start, end] }
  output: { type: multi, outputs: [{ index: a }] }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("do not match"));
    }

    #[test]
    fn test_missing_file() {
        let err =
            PatternRegistry::load_from_file("/nonexistent/patterns.yaml", &HandlerRegistry::builtin())
                .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
