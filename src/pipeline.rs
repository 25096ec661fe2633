//! Per-file extraction and batch plan construction.
//!
//! For one file name: tokenize, resolve spans, extract and transform each
//! span in start order, merge the field mappings, check mandatory fields,
//! render. For a batch: do that for every walker entry and collect the
//! results into a [`BatchPlan`] without touching the filesystem.

use crate::document::{Doc, Span};
use crate::error::Result;
use crate::extraction::{extract_value, ExtractionError};
use crate::fields::{merge_all, FieldMapping};
use crate::handlers::HandlerRegistry;
use crate::matcher::EntityResolver;
use crate::patterns::PatternRegistry;
use crate::rename::BatchPlan;
use crate::template::TemplateRenderer;
use crate::tokenizer::doc_for;
use crate::transform::process_output;
use crate::walker::{FileEntry, WalkError};
use tracing::{debug, info};

/// Options for the extraction stage
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Substrings removed from every file name before tokenizing
    pub strips: Vec<String>,
    /// Fields that must be present for a file to get a new name
    pub mandatory: Option<Vec<String>>,
}

/// Name proposal engine.
///
/// Holds references to the immutable configuration built at startup plus
/// the resolver and renderer collaborators.
pub struct Pipeline<'a> {
    patterns: &'a PatternRegistry,
    handlers: &'a HandlerRegistry,
    resolver: &'a dyn EntityResolver,
    renderer: &'a dyn TemplateRenderer,
    options: ExtractOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        patterns: &'a PatternRegistry,
        handlers: &'a HandlerRegistry,
        resolver: &'a dyn EntityResolver,
        renderer: &'a dyn TemplateRenderer,
    ) -> Self {
        Self {
            patterns,
            handlers,
            resolver,
            renderer,
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Tokenize a file name with the configured strips.
    pub fn doc(&self, file_name: &str) -> Doc {
        doc_for(file_name, &self.options.strips)
    }

    /// Merged field mapping for every span the resolver finds in `doc`.
    ///
    /// # Errors
    /// Fails if a span's label has no rule, an index is out of range, or a
    /// handler rejects a value.
    pub fn fields_for(&self, doc: &Doc) -> Result<FieldMapping> {
        let mut spans: Vec<Span> = self.resolver.resolve(doc);
        spans.sort_by_key(|s| s.start);

        let mappings = spans
            .iter()
            .map(|span| self.span_fields(doc, span))
            .collect::<Result<Vec<_>>>()?;
        Ok(merge_all(mappings))
    }

    fn span_fields(&self, doc: &Doc, span: &Span) -> Result<FieldMapping> {
        let rule = self
            .patterns
            .get(&span.label)
            .ok_or_else(|| ExtractionError::UnknownLabel(span.label.clone()))?;

        let value = extract_value(doc, span, &rule.input)?;
        debug!("{} [{}, {}) -> {}", span.label, span.start, span.end, value);
        Ok(process_output(&span.label, &value, &rule.output, self.handlers)?)
    }

    /// Propose a new name for one file name.
    ///
    /// # Returns
    /// `Ok(None)` when nothing was extracted, a mandatory field is missing,
    /// or the rendered name is blank
    ///
    /// # Errors
    /// Extraction, transform and render failures are returned as errors and
    /// should abort the run.
    pub fn propose(&self, file_name: &str) -> Result<Option<String>> {
        let doc = self.doc(file_name);
        let fields = self.fields_for(&doc)?;

        if fields.is_empty() {
            debug!("{}: no fields extracted", file_name);
            return Ok(None);
        }

        if let Some(mandatory) = &self.options.mandatory {
            let missing = fields.missing(mandatory);
            if !missing.is_empty() {
                debug!("{}: missing mandatory fields {:?}", file_name, missing);
                return Ok(None);
            }
        }

        let rendered = self.renderer.render(&fields)?;
        let rendered = rendered.trim();
        if rendered.is_empty() {
            return Ok(None);
        }
        Ok(Some(rendered.to_string()))
    }

    /// Build a batch plan from walker entries.
    ///
    /// The whole plan is computed before anything is renamed, so a fatal
    /// error leaves every file untouched.
    pub fn plan<I>(&self, entries: I) -> Result<BatchPlan>
    where
        I: IntoIterator<Item = std::result::Result<FileEntry, WalkError>>,
    {
        let mut plan = BatchPlan::new();
        let mut count = 0usize;

        for entry in entries {
            let entry = entry?;
            let proposed = self.propose(&entry.name)?;
            debug!("{} -> {:?}", entry.name, proposed);
            plan.entry(entry.dir).or_default().insert(entry.name, proposed);
            count += 1;
        }

        info!("Proposed names for {} files in {} directories", count, plan.len());
        Ok(plan)
    }
}
