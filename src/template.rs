//! Template rendering of merged field mappings into new file names.

use crate::fields::FieldMapping;
use handlebars::Handlebars;
use std::fmt;

const TEMPLATE_NAME: &str = "file_name";

/// Error type for template problems
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// The template string could not be parsed
    Syntax(String),
    /// A placeholder could not be resolved against the fields
    Render(String),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Syntax(msg) => write!(f, "Template syntax error: {}", msg),
            TemplateError::Render(msg) => write!(f, "Template render error: {}", msg),
        }
    }
}

impl std::error::Error for TemplateError {}

/// Renders a field mapping into a string
pub trait TemplateRenderer {
    fn render(&self, fields: &FieldMapping) -> Result<String, TemplateError>;
}

/// Handlebars renderer in strict mode.
///
/// The template is compiled once when the renderer is built, so syntax
/// errors surface before any file is processed. Referencing a field that is
/// not in the mapping fails the render. Output is not HTML-escaped.
///
/// # Example
/// ```
/// use multirename::{FieldMapping, HandlebarsRenderer, TemplateRenderer};
///
/// let renderer = HandlebarsRenderer::new("{{volume}}-{{number}}.pdf").unwrap();
/// let fields: FieldMapping = [("volume", "4"), ("number", "3")].into_iter().collect();
///
/// assert_eq!(renderer.render(&fields).unwrap(), "4-3.pdf");
/// ```
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
    source: String,
}

impl HandlebarsRenderer {
    /// Compile a template string.
    ///
    /// # Errors
    /// Returns [`TemplateError::Syntax`] if the template is malformed.
    pub fn new(template: &str) -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| TemplateError::Syntax(e.to_string()))?;

        Ok(Self {
            registry,
            source: template.to_string(),
        })
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(&self, fields: &FieldMapping) -> Result<String, TemplateError> {
        self.registry
            .render(TEMPLATE_NAME, fields)
            .map_err(|e| TemplateError::Render(e.to_string()))
    }
}

impl fmt::Debug for HandlebarsRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlebarsRenderer")
            .field("source", &self.source)
            .finish()
    }
}
