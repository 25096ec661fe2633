//! # Multirename: Rule-Driven Batch File Renamer
//!
//! Multirename derives a new name for each file in a batch by extracting
//! structured fields from its current name and rendering them through a
//! template.
//!
//! ## Features
//!
//! - **Declarative patterns**: YAML rules bind a label to a token match spec, an input rule and an output rule
//! - **Closed handler registry**: `numeral`, `date` and `joiner` value transforms, validated at load time
//! - **Strict templates**: Handlebars rendering that fails on any unresolved placeholder
//! - **Collision-safe renames**: existing files are never overwritten; `-1`, `-2`, ... suffixes are added instead
//! - **Replayable plans**: proposed names and rename reports are saved as JSON and can be replayed or undone
//!
//! ## Example: patterns.yaml
//!
//! ```yaml
//! VOLUME:
//!   patterns:
//!     - - LOWER: vol
//!       - TEXT: { REGEX: "^[IVXLCDMivxlcdm]+$" }
//!   input: { type: single, index: end }
//!   output: { type: single, index: volume, handler: numeral }
//! NUMBER:
//!   patterns:
//!     - - LOWER: "no"
//!       - IS_DIGIT: true
//!   input: { type: single, index: end }
//!   output: { type: single, index: number }
//! ```
//!
//! ## Example: proposing a name
//!
//! ```
//! use multirename::{HandlebarsRenderer, HandlerRegistry, PatternRegistry, Pipeline, TokenMatcher};
//!
//! let yaml = r#"
//! VOLUME:
//!   patterns: [[{ LOWER: vol }, { TEXT: { REGEX: "^[IVXLCDM]+$" } }]]
//!   input: { type: single, index: end }
//!   output: { type: single, index: volume, handler: numeral }
//! NUMBER:
//!   patterns: [[{ LOWER: "no" }, { IS_DIGIT: true }]]
//!   input: { type: single, index: end }
//!   output: { type: single, index: number }
//! "#;
//!
//! let handlers = HandlerRegistry::builtin();
//! let patterns = PatternRegistry::from_yaml_str(yaml, &handlers).unwrap();
//! let matcher = TokenMatcher::new(&patterns).unwrap();
//! let renderer = HandlebarsRenderer::new("{{volume}}-{{number}}.pdf").unwrap();
//!
//! let pipeline = Pipeline::new(&patterns, &handlers, &matcher, &renderer);
//! assert_eq!(
//!     pipeline.propose("Vol IV No 3 (1994).pdf").unwrap().as_deref(),
//!     Some("4-3.pdf")
//! );
//! ```

// Core model
pub mod document;
pub mod tokenizer;
pub mod patterns;
pub mod matcher;

// Extraction and transformation
pub mod extraction;
pub mod handlers;
pub mod transform;
pub mod fields;
pub mod template;
pub mod pipeline;

// Batch execution
pub mod walker;
pub mod rename;
pub mod serialization;

pub mod error;

// Re-export key types
pub use document::{Doc, RawValue, Span, Token, ValueShape};
pub use error::Error;
pub use fields::FieldMapping;
pub use handlers::{Handler, HandlerError, HandlerRegistry};
pub use matcher::{EntityResolver, TokenMatcher};
pub use patterns::{ConfigError, InputRule, OutputRule, PatternRegistry, PatternRule, TokenIndex};
pub use pipeline::{ExtractOptions, Pipeline};
pub use rename::{rename_files, BatchPlan, RenameOutcome, RenameRecord, RenameReport};
pub use template::{HandlebarsRenderer, TemplateError, TemplateRenderer};
pub use walker::{BatchWalker, FileEntry, WalkError};
