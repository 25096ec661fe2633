//! Token-pattern entity resolver.
//!
//! Each label in the pattern registry carries one or more token patterns.
//! [`TokenMatcher`] finds every match of every pattern in a [`Doc`] and then
//! keeps a non-overlapping subset, preferring longer spans and, between equal
//! lengths, the earlier one.

use crate::document::{Doc, Span, Token};
use crate::patterns::{ConfigError, PatternRegistry};
use regex::Regex;
use serde::Deserialize;

/// Resolves labeled, non-overlapping spans over a doc.
///
/// Implement this trait to plug in a different recognizer; the rest of the
/// extraction pipeline only sees the spans it returns.
pub trait EntityResolver {
    /// Spans ordered by start position, with no overlapping ranges
    fn resolve(&self, doc: &Doc) -> Vec<Span>;
}

/// String attribute test: exact text or a predicate
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StringMatch {
    Exact(String),
    Predicate(StringPredicate),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StringPredicate {
    #[serde(rename = "REGEX", default)]
    pub regex: Option<String>,
    #[serde(rename = "IN", default)]
    pub one_of: Option<Vec<String>>,
    #[serde(rename = "NOT_IN", default)]
    pub none_of: Option<Vec<String>>,
}

/// How many tokens a token pattern consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Quantifier {
    #[default]
    #[serde(rename = "1")]
    One,
    #[serde(rename = "!")]
    Negate,
    #[serde(rename = "?")]
    Optional,
    #[serde(rename = "*")]
    ZeroOrMore,
    #[serde(rename = "+")]
    OneOrMore,
}

/// Attribute tests for one token; all given tests must hold
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenPattern {
    #[serde(rename = "TEXT", alias = "ORTH", default)]
    pub text: Option<StringMatch>,
    #[serde(rename = "LOWER", default)]
    pub lower: Option<StringMatch>,
    #[serde(rename = "LENGTH", default)]
    pub length: Option<usize>,
    #[serde(rename = "IS_DIGIT", default)]
    pub is_digit: Option<bool>,
    #[serde(rename = "IS_ALPHA", default)]
    pub is_alpha: Option<bool>,
    #[serde(rename = "IS_PUNCT", default)]
    pub is_punct: Option<bool>,
    #[serde(rename = "IS_UPPER", default)]
    pub is_upper: Option<bool>,
    #[serde(rename = "IS_TITLE", default)]
    pub is_title: Option<bool>,
    #[serde(rename = "LIKE_NUM", default)]
    pub like_num: Option<bool>,
    #[serde(rename = "OP", default)]
    pub op: Quantifier,
}

#[derive(Debug)]
enum CompiledString {
    Exact(String),
    Predicate {
        regex: Option<Regex>,
        one_of: Option<Vec<String>>,
        none_of: Option<Vec<String>>,
    },
}

impl CompiledString {
    fn compile(value: &StringMatch) -> Result<Self, String> {
        match value {
            StringMatch::Exact(s) => Ok(CompiledString::Exact(s.clone())),
            StringMatch::Predicate(p) => {
                let regex = p
                    .regex
                    .as_deref()
                    .map(Regex::new)
                    .transpose()
                    .map_err(|e| e.to_string())?;
                Ok(CompiledString::Predicate {
                    regex,
                    one_of: p.one_of.clone(),
                    none_of: p.none_of.clone(),
                })
            }
        }
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            CompiledString::Exact(s) => s == text,
            CompiledString::Predicate {
                regex,
                one_of,
                none_of,
            } => {
                regex.as_ref().map_or(true, |r| r.is_match(text))
                    && one_of.as_ref().map_or(true, |v| v.iter().any(|s| s == text))
                    && none_of.as_ref().map_or(true, |v| !v.iter().any(|s| s == text))
            }
        }
    }
}

struct CompiledToken {
    text: Option<CompiledString>,
    lower: Option<CompiledString>,
    length: Option<usize>,
    flags: Vec<(fn(&Token) -> bool, bool)>,
    op: Quantifier,
}

impl CompiledToken {
    fn compile(pattern: &TokenPattern) -> Result<Self, String> {
        let checks: [(Option<bool>, fn(&Token) -> bool); 6] = [
            (pattern.is_digit, Token::is_digit),
            (pattern.is_alpha, Token::is_alpha),
            (pattern.is_punct, Token::is_punct),
            (pattern.is_upper, Token::is_upper),
            (pattern.is_title, Token::is_title),
            (pattern.like_num, Token::like_num),
        ];
        let flags = checks
            .into_iter()
            .filter_map(|(wanted, test)| wanted.map(|w| (test, w)))
            .collect();

        Ok(Self {
            text: pattern.text.as_ref().map(CompiledString::compile).transpose()?,
            lower: pattern.lower.as_ref().map(CompiledString::compile).transpose()?,
            length: pattern.length,
            flags,
            op: pattern.op,
        })
    }

    /// Attribute tests only; the quantifier is handled by the caller.
    fn accepts(&self, token: &Token) -> bool {
        self.text.as_ref().map_or(true, |m| m.matches(&token.text))
            && self.lower.as_ref().map_or(true, |m| m.matches(&token.lower()))
            && self
                .length
                .map_or(true, |n| token.text.chars().count() == n)
            && self.flags.iter().all(|(test, wanted)| test(token) == *wanted)
    }
}

struct CompiledRule {
    label: String,
    alternatives: Vec<Vec<CompiledToken>>,
}

/// Entity resolver driven by the token patterns of a [`PatternRegistry`]
pub struct TokenMatcher {
    rules: Vec<CompiledRule>,
}

impl std::fmt::Debug for TokenMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenMatcher")
            .field("labels", &self.rules.iter().map(|r| &r.label).collect::<Vec<_>>())
            .finish()
    }
}

impl TokenMatcher {
    /// Compile every label's patterns.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidMatchPattern`] for an invalid REGEX or
    /// an empty pattern.
    pub fn new(registry: &PatternRegistry) -> Result<Self, ConfigError> {
        let mut rules = Vec::with_capacity(registry.len());

        for (label, rule) in registry.iter() {
            let invalid = |message: String| ConfigError::InvalidMatchPattern {
                label: label.to_string(),
                message,
            };

            let mut alternatives = Vec::with_capacity(rule.patterns.len());
            for pattern in &rule.patterns {
                if pattern.is_empty() {
                    return Err(invalid("pattern must contain at least one token".to_string()));
                }
                let compiled = pattern
                    .iter()
                    .map(CompiledToken::compile)
                    .collect::<Result<Vec<_>, String>>()
                    .map_err(invalid)?;
                alternatives.push(compiled);
            }

            rules.push(CompiledRule {
                label: label.to_string(),
                alternatives,
            });
        }

        Ok(Self { rules })
    }

    /// Every match of every pattern, before overlap resolution.
    pub fn find_all(&self, doc: &Doc) -> Vec<Span> {
        let tokens = doc.tokens();
        let mut found = Vec::new();

        for rule in &self.rules {
            for alternative in &rule.alternatives {
                for start in 0..tokens.len() {
                    let mut ends = Vec::new();
                    match_ends(alternative, tokens, start, &mut ends);
                    ends.sort_unstable();
                    ends.dedup();
                    for end in ends.into_iter().filter(|&end| end > start) {
                        let span = Span::new(rule.label.clone(), start, end);
                        if !found.contains(&span) {
                            found.push(span);
                        }
                    }
                }
            }
        }

        found
    }
}

impl EntityResolver for TokenMatcher {
    fn resolve(&self, doc: &Doc) -> Vec<Span> {
        filter_spans(self.find_all(doc))
    }
}

/// Collect every end position reachable by matching `pattern` from `pos`.
fn match_ends(pattern: &[CompiledToken], tokens: &[Token], pos: usize, ends: &mut Vec<usize>) {
    let Some((head, rest)) = pattern.split_first() else {
        ends.push(pos);
        return;
    };
    let accepts_at = |p: usize| p < tokens.len() && head.accepts(&tokens[p]);

    match head.op {
        Quantifier::One => {
            if accepts_at(pos) {
                match_ends(rest, tokens, pos + 1, ends);
            }
        }
        Quantifier::Negate => {
            if pos < tokens.len() && !head.accepts(&tokens[pos]) {
                match_ends(rest, tokens, pos + 1, ends);
            }
        }
        Quantifier::Optional => {
            match_ends(rest, tokens, pos, ends);
            if accepts_at(pos) {
                match_ends(rest, tokens, pos + 1, ends);
            }
        }
        Quantifier::ZeroOrMore | Quantifier::OneOrMore => {
            if head.op == Quantifier::ZeroOrMore {
                match_ends(rest, tokens, pos, ends);
            }
            let mut p = pos;
            while accepts_at(p) {
                p += 1;
                match_ends(rest, tokens, p, ends);
            }
        }
    }
}

/// Keep a non-overlapping subset of spans.
///
/// Longer spans win; among equal lengths the earlier start wins, then the
/// earlier candidate. The result is ordered by start position.
pub fn filter_spans(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by(|a, b| b.len().cmp(&a.len()).then(a.start.cmp(&b.start)));

    let mut kept: Vec<Span> = Vec::new();
    for span in spans {
        if !kept.iter().any(|k| k.overlaps(&span)) {
            kept.push(span);
        }
    }

    kept.sort_by_key(|s| s.start);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerRegistry;
    use crate::tokenizer::doc_for;

    fn matcher(yaml: &str) -> TokenMatcher {
        let registry = PatternRegistry::from_yaml_str(yaml, &HandlerRegistry::builtin()).unwrap();
        TokenMatcher::new(&registry).unwrap()
    }

    const PATTERNS: &str = r#"
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
      - { LOWER: and, OP: "?" }
      - { IS_DIGIT: true, OP: "?" }
  input: { type: all }
  output: { type: single, index: number }
YEAR:
  patterns:
    - - TEXT: "("
      - { IS_DIGIT: true, LENGTH: 4 }
      - TEXT: ")"
  input: { type: distinct, indexes: [1] }
  output: { type: multi, outputs: [{ index: year }] }
"#;

    #[test]
    fn test_resolve_labels_in_order() {
        let doc = doc_for("Vol IV No 3 and 4 (1994).pdf", &[]);
        let spans = matcher(PATTERNS).resolve(&doc);

        assert_eq!(
            spans,
            vec![
                Span::new("VOLUME", 0, 2),
                Span::new("NUMBER", 2, 6),
                Span::new("YEAR", 6, 9),
            ]
        );
    }

    #[test]
    fn test_optional_tokens_prefer_longest() {
        let doc = doc_for("No 3 extra", &[]);
        let spans = matcher(PATTERNS).resolve(&doc);

        assert_eq!(spans, vec![Span::new("NUMBER", 0, 2)]);
    }

    #[test]
    fn test_repeat_and_negate() {
        let m = matcher(
            r#"
TITLE:
  patterns:
    - - { IS_TITLE: true, OP: "+" }
      - { IS_DIGIT: true, OP: "!" }
  input: { type: all }
  output: { type: single, index: title }
"#,
        );
        let doc = doc_for("Annual Report Summary 2020", &[]);

        // `!` consumes exactly one non-digit token, so "2020" is never reached.
        assert_eq!(m.resolve(&doc), vec![Span::new("TITLE", 0, 3)]);
    }

    #[test]
    fn test_filter_spans_longest_then_first() {
        let spans = vec![
            Span::new("A", 0, 2),
            Span::new("B", 1, 4),
            Span::new("C", 4, 5),
            Span::new("D", 5, 6),
            Span::new("E", 5, 6),
        ];

        assert_eq!(
            filter_spans(spans),
            vec![Span::new("B", 1, 4), Span::new("C", 4, 5), Span::new("D", 5, 6)]
        );
    }

    #[test]
    fn test_invalid_regex() {
        let registry = PatternRegistry::from_yaml_str(
            r#"
X:
  patterns: [[{ TEXT: { REGEX: "([" } }]]
  input: { type: all }
  output: { type: single, index: x }
"#,
            &HandlerRegistry::builtin(),
        )
        .unwrap();

        assert!(matches!(
            TokenMatcher::new(&registry),
            Err(ConfigError::InvalidMatchPattern { .. })
        ));
    }

    #[test]
    fn test_unknown_token_attribute_rejected() {
        let result = PatternRegistry::from_yaml_str(
            r#"
X:
  patterns: [[{ SHAPE: "dd" }]]
  input: { type: all }
  output: { type: single, index: x }
"#,
            &HandlerRegistry::builtin(),
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
