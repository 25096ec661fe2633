//! Token sequences, labeled spans and raw extracted values.
//!
//! A [`Doc`] is built once per file name and never mutated afterwards. Spans
//! are half-open token ranges over a `Doc`, addressed by integer position.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single token of a preprocessed file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }

    pub fn is_digit(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(|c| c.is_ascii_digit())
    }

    pub fn is_alpha(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_alphabetic)
    }

    pub fn is_punct(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(|c| c.is_ascii_punctuation())
    }

    pub fn is_upper(&self) -> bool {
        self.text.chars().any(char::is_alphabetic)
            && !self.text.chars().any(char::is_lowercase)
    }

    pub fn is_title(&self) -> bool {
        let mut chars = self.text.chars();
        match chars.next() {
            Some(first) if first.is_uppercase() => !chars.any(char::is_uppercase),
            _ => false,
        }
    }

    /// Digits with optional `,`/`.` separators, or a simple fraction like `1/2`
    pub fn like_num(&self) -> bool {
        let cleaned: String = self.text.chars().filter(|c| *c != ',' && *c != '.').collect();
        if !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_digit()) {
            return true;
        }
        match self.text.split_once('/') {
            Some((num, den)) => {
                !num.is_empty()
                    && !den.is_empty()
                    && num.chars().all(|c| c.is_ascii_digit())
                    && den.chars().all(|c| c.is_ascii_digit())
            }
            None => false,
        }
    }
}

/// Ordered, immutable token sequence for one file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doc {
    tokens: Vec<Token>,
}

impl Doc {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Build a doc from already-split token texts.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(Token::new).collect())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Surface text of the tokens in `[start, end)`, single-space separated.
    pub fn text_between(&self, start: usize, end: usize) -> String {
        let end = end.min(self.tokens.len());
        if start >= end {
            return String::new();
        }
        self.tokens[start..end]
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A labeled half-open token range `[start, end)` within a [`Doc`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(label: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the span's last token
    pub fn last(&self) -> usize {
        self.end.saturating_sub(1)
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Whether a value is a single string or an ordered list of strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueShape {
    Scalar,
    List,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueShape::Scalar => write!(f, "scalar"),
            ValueShape::List => write!(f, "list"),
        }
    }
}

/// Raw value pulled out of a span by an input rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Scalar(String),
    List(Vec<String>),
}

impl RawValue {
    pub fn shape(&self) -> ValueShape {
        match self {
            RawValue::Scalar(_) => ValueShape::Scalar,
            RawValue::List(_) => ValueShape::List,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            RawValue::Scalar(s) => Some(s),
            RawValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            RawValue::Scalar(_) => None,
            RawValue::List(items) => Some(items),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Scalar(s) => write!(f, "{}", s),
            RawValue::List(items) => write!(f, "{:?}", items),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Scalar(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Scalar(value)
    }
}

impl From<Vec<String>> for RawValue {
    fn from(values: Vec<String>) -> Self {
        RawValue::List(values)
    }
}
