//! File name preprocessing and tokenization.

use crate::document::{Doc, Token};
use regex::Regex;
use std::sync::OnceLock;

fn punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([-:.,()\[\]{}])").expect("valid punctuation regex"))
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Normalize a file name before tokenization.
///
/// Every occurrence of each `strips` entry is removed, separator punctuation
/// is padded with spaces and whitespace runs collapse to a single space.
///
/// # Example
///
/// ```
/// use multirename::tokenizer::preprocess;
///
/// assert_eq!(preprocess("Vol IV No 3 (1994).pdf", &[]), "Vol IV No 3 ( 1994 ) . pdf");
/// ```
pub fn preprocess(file_name: &str, strips: &[String]) -> String {
    let mut processed = file_name.to_string();
    for strip in strips.iter().filter(|s| !s.is_empty()) {
        processed = processed.replace(strip.as_str(), "");
    }

    let padded = punctuation().replace_all(processed.trim(), " $1 ");
    whitespace().replace_all(&padded, " ").trim().to_string()
}

/// Split a preprocessed string into a [`Doc`].
pub fn tokenize(processed: &str) -> Doc {
    Doc::new(
        processed
            .split(' ')
            .filter(|t| !t.is_empty())
            .map(Token::new)
            .collect(),
    )
}

/// Preprocess and tokenize a file name in one step.
pub fn doc_for(file_name: &str, strips: &[String]) -> Doc {
    tokenize(&preprocess(file_name, strips))
}
