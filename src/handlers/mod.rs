//! Closed registry of value handlers.
//!
//! A handler is a named, pure transform applied to a raw extracted value
//! before it is stored in the field mapping. The set of handlers is fixed at
//! build time (`numeral`, `date`, `joiner`); pattern files can only refer to
//! them by name, and those names and their arguments are validated when the
//! pattern registry is loaded.

mod date;
mod joiner;
mod numeral;

pub use date::{parse_date, DateHandler};
pub use joiner::JoinerHandler;
pub use numeral::{roman_to_int, NumeralHandler};

use crate::document::{RawValue, ValueShape};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Named handler arguments as written in the pattern file
pub type HandlerArgs = HashMap<String, Value>;

/// Error type for handler operations
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerError {
    NotFound(String),
    InvalidArgs {
        handler: String,
        message: String,
    },
    ShapeMismatch {
        handler: String,
        expected: ValueShape,
        actual: ValueShape,
    },
    InvalidNumeral(String),
    InvalidDate {
        value: String,
        reason: String,
    },
    LengthMismatch {
        values: usize,
        outputs: usize,
    },
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::NotFound(name) => write!(f, "Handler {} is not implemented", name),
            HandlerError::InvalidArgs { handler, message } => {
                write!(f, "Invalid arguments for handler '{}': {}", handler, message)
            }
            HandlerError::ShapeMismatch {
                handler,
                expected,
                actual,
            } => write!(
                f,
                "Handler '{}' expects a {} value, got a {}",
                handler, expected, actual
            ),
            HandlerError::InvalidNumeral(value) => {
                write!(f, "Invalid roman numeral '{}'", value)
            }
            HandlerError::InvalidDate { value, reason } => {
                write!(f, "Invalid date '{}': {}", value, reason)
            }
            HandlerError::LengthMismatch { values, outputs } => write!(
                f,
                "multi output handling: count of values ({}) and outputs ({}) do not match",
                values, outputs
            ),
        }
    }
}

impl std::error::Error for HandlerError {}

/// How a single value is turned into its final form: an optional handler
/// name plus that handler's arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueSpec {
    #[serde(default)]
    pub handler: Option<String>,
    #[serde(default)]
    pub args: HandlerArgs,
}

impl ValueSpec {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn with_handler(name: impl Into<String>, args: HandlerArgs) -> Self {
        Self {
            handler: Some(name.into()),
            args,
        }
    }
}

/// Capability shared by every handler
pub trait Handler: Send + Sync {
    /// Shape of the value this handler consumes
    fn accepts(&self) -> ValueShape;

    /// Check the arguments once, at pattern load time.
    fn validate(&self, args: &HandlerArgs, registry: &HandlerRegistry) -> Result<(), HandlerError>;

    /// Transform a raw value into its final string form.
    fn transform(
        &self,
        value: &RawValue,
        args: &HandlerArgs,
        registry: &HandlerRegistry,
    ) -> Result<String, HandlerError>;
}

/// Registry of the built-in handlers, keyed by the name used in pattern files
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn Handler>>,
}

impl HandlerRegistry {
    /// Registry with every built-in handler.
    ///
    /// `convert_roman_nums` is accepted as an alias of `numeral` so pattern
    /// files written for older versions of the tool keep loading.
    pub fn builtin() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };
        registry.register("numeral", Box::new(NumeralHandler));
        registry.register("convert_roman_nums", Box::new(NumeralHandler));
        registry.register("date", Box::new(DateHandler));
        registry.register("joiner", Box::new(JoinerHandler));
        registry
    }

    fn register(&mut self, name: impl Into<String>, handler: Box<dyn Handler>) {
        self.handlers.insert(name.into(), handler);
    }

    /// Look up a handler by name
    pub fn get(&self, name: &str) -> Result<&dyn Handler, HandlerError> {
        self.handlers
            .get(name)
            .map(|h| h.as_ref())
            .ok_or_else(|| HandlerError::NotFound(name.to_string()))
    }

    /// Sorted list of registered handler names
    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Validate a value spec and return the shape it consumes.
    ///
    /// A spec without a handler passes values through untouched, so it
    /// reports `None` and the caller decides what shape is acceptable.
    pub fn validate_spec(&self, spec: &ValueSpec) -> Result<Option<ValueShape>, HandlerError> {
        match &spec.handler {
            None => {
                if !spec.args.is_empty() {
                    return Err(HandlerError::InvalidArgs {
                        handler: "<none>".to_string(),
                        message: "args given without a handler".to_string(),
                    });
                }
                Ok(None)
            }
            Some(name) => {
                let handler = self.get(name)?;
                handler.validate(&spec.args, self)?;
                Ok(Some(handler.accepts()))
            }
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handler_names())
            .finish()
    }
}

/// Fetch a required string argument
pub(crate) fn string_arg<'a>(
    handler: &str,
    args: &'a HandlerArgs,
    key: &str,
) -> Result<&'a str, HandlerError> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(HandlerError::InvalidArgs {
            handler: handler.to_string(),
            message: format!("'{}' must be a string, got {}", key, other),
        }),
        None => Err(HandlerError::InvalidArgs {
            handler: handler.to_string(),
            message: format!("missing required argument '{}'", key),
        }),
    }
}

/// Reject argument names a handler does not understand
pub(crate) fn reject_unknown_args(
    handler: &str,
    args: &HandlerArgs,
    known: &[&str],
) -> Result<(), HandlerError> {
    let mut unknown: Vec<&str> = args
        .keys()
        .map(|k| k.as_str())
        .filter(|k| !known.contains(k))
        .collect();
    if unknown.is_empty() {
        return Ok(());
    }
    unknown.sort_unstable();
    Err(HandlerError::InvalidArgs {
        handler: handler.to_string(),
        message: format!("unexpected argument(s): {}", unknown.join(", ")),
    })
}

/// Ensure a value has the shape a handler consumes
pub(crate) fn expect_shape(
    handler: &str,
    expected: ValueShape,
    value: &RawValue,
) -> Result<(), HandlerError> {
    if value.shape() == expected {
        Ok(())
    } else {
        Err(HandlerError::ShapeMismatch {
            handler: handler.to_string(),
            expected,
            actual: value.shape(),
        })
    }
}
