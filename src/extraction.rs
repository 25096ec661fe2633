//! Raw value extraction from labeled spans.
//!
//! An [`InputRule`] addresses tokens relative to a span (or, for
//! `single` with an integer index, absolutely within the doc) and yields
//! either one string or an ordered list of strings.

use crate::document::{Doc, RawValue, Span};
use crate::patterns::{InputRule, TokenIndex};
use std::fmt;

/// Error type for extraction problems found while processing a file.
///
/// These come from rules that cannot be applied to the spans the resolver
/// produced, so they abort the run like configuration errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    UnknownLabel(String),
    IndexOutOfRange {
        label: String,
        index: i64,
        len: usize,
    },
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::UnknownLabel(label) => write!(f, "{} is not supported", label),
            ExtractionError::IndexOutOfRange { label, index, len } => write!(
                f,
                "{}: token index {} is out of range for a name with {} tokens",
                label, index, len
            ),
        }
    }
}

impl std::error::Error for ExtractionError {}

fn token_text(doc: &Doc, span: &Span, position: i64) -> Result<String, ExtractionError> {
    usize::try_from(position)
        .ok()
        .and_then(|p| doc.get(p))
        .map(|t| t.text.clone())
        .ok_or_else(|| ExtractionError::IndexOutOfRange {
            label: span.label.clone(),
            index: position,
            len: doc.len(),
        })
}

/// Position of a `distinct` index: negative offsets count back from the
/// span end, non-negative ones forward from the span start.
pub fn distinct_position(span: &Span, index: TokenIndex) -> i64 {
    match index {
        TokenIndex::Start => span.start as i64,
        TokenIndex::End => span.end as i64 - 1,
        TokenIndex::Offset(n) if n < 0 => span.end as i64 + n,
        TokenIndex::Offset(n) => span.start as i64 + n,
    }
}

/// Half-open token range of a `multi` rule.
///
/// Both integer offsets are added to the span start, so `end: 2` means "two
/// tokens after the span start", not "relative to the span end".
pub fn multi_range(span: &Span, start: Option<TokenIndex>, end: Option<TokenIndex>) -> (i64, i64) {
    let base = span.start as i64;
    let from = match start {
        Some(TokenIndex::Offset(n)) => base + n,
        _ => base,
    };
    let to = match end {
        Some(TokenIndex::Offset(n)) => base + n,
        _ => span.end as i64,
    };
    (from, to)
}

/// Resolve an input rule against a span.
///
/// # Errors
/// Returns [`ExtractionError::IndexOutOfRange`] when a rule addresses a
/// token outside the doc.
///
/// # Example
/// ```
/// use multirename::document::{Doc, RawValue, Span};
/// use multirename::extraction::extract_value;
/// use multirename::patterns::{InputRule, TokenIndex};
///
/// let doc = Doc::from_texts(["Vol", "IV", "No", "3"]);
/// let span = Span::new("VOLUME", 0, 2);
/// let rule = InputRule::Single { index: TokenIndex::End };
///
/// assert_eq!(extract_value(&doc, &span, &rule).unwrap(), RawValue::from("IV"));
/// ```
pub fn extract_value(doc: &Doc, span: &Span, rule: &InputRule) -> Result<RawValue, ExtractionError> {
    match rule {
        InputRule::Single { index } => {
            let position = match *index {
                TokenIndex::Start => span.start as i64,
                TokenIndex::End => span.end as i64 - 1,
                // Absolute doc position; negative counts back from the doc end.
                TokenIndex::Offset(n) if n < 0 => doc.len() as i64 + n,
                TokenIndex::Offset(n) => n,
            };
            token_text(doc, span, position).map(RawValue::Scalar)
        }
        InputRule::All => Ok(RawValue::Scalar(doc.text_between(span.start, span.end))),
        InputRule::Distinct { indexes } => indexes
            .iter()
            .map(|&index| token_text(doc, span, distinct_position(span, index)))
            .collect::<Result<Vec<_>, _>>()
            .map(RawValue::List),
        InputRule::Multi { start, end } => {
            let (from, to) = multi_range(span, *start, *end);
            if from >= to {
                return Ok(RawValue::List(Vec::new()));
            }
            (from..to)
                .map(|position| token_text(doc, span, position))
                .collect::<Result<Vec<_>, _>>()
                .map(RawValue::List)
        }
    }
}
