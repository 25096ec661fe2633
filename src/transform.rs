//! Value transformer: raw value + output rule → named fields.

use crate::document::RawValue;
use crate::fields::FieldMapping;
use crate::handlers::{HandlerError, HandlerRegistry, ValueSpec};
use crate::patterns::{OutputRule, OutputSpec};
use std::fmt;

/// Error type for output processing
#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    Handler {
        label: String,
        source: HandlerError,
    },
    LengthMismatch {
        label: String,
        values: usize,
        outputs: usize,
    },
    NotScalar {
        label: String,
        field: String,
    },
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::Handler { label, source } => write!(f, "{}: {}", label, source),
            TransformError::LengthMismatch {
                label,
                values,
                outputs,
            } => write!(
                f,
                "{}: multi output handling: count of values ({}) and outputs ({}) do not match",
                label, values, outputs
            ),
            TransformError::NotScalar { label, field } => write!(
                f,
                "{}: field '{}' received a list value without a handler to reduce it",
                label, field
            ),
        }
    }
}

impl std::error::Error for TransformError {}

/// Apply the handler named in `spec`, if any, to a value.
///
/// Without a handler the value is returned unchanged.
pub fn get_value(
    value: &RawValue,
    spec: &ValueSpec,
    handlers: &HandlerRegistry,
) -> Result<RawValue, HandlerError> {
    match &spec.handler {
        None => Ok(value.clone()),
        Some(name) => handlers
            .get(name)?
            .transform(value, &spec.args, handlers)
            .map(RawValue::Scalar),
    }
}

fn field_value(
    label: &str,
    value: &RawValue,
    spec: &OutputSpec,
    handlers: &HandlerRegistry,
) -> Result<String, TransformError> {
    let result = get_value(value, &spec.value, handlers).map_err(|source| TransformError::Handler {
        label: label.to_string(),
        source,
    })?;

    match result {
        RawValue::Scalar(s) => Ok(s),
        RawValue::List(_) => Err(TransformError::NotScalar {
            label: label.to_string(),
            field: spec.index.clone(),
        }),
    }
}

/// Turn a raw value into output fields according to an output rule.
///
/// `single` writes one field. `multi` pairs values with output specs: a
/// scalar is broadcast to every spec, a list is zipped with the specs and
/// must have the same length.
///
/// # Arguments
/// * `label` - Span label, used in error messages
/// * `value` - Raw value from the input rule
/// * `rule` - Output rule for the label
/// * `handlers` - Handler registry
pub fn process_output(
    label: &str,
    value: &RawValue,
    rule: &OutputRule,
    handlers: &HandlerRegistry,
) -> Result<FieldMapping, TransformError> {
    let mut fields = FieldMapping::new();

    match rule {
        OutputRule::Single(spec) => {
            fields.insert(spec.index.clone(), field_value(label, value, spec, handlers)?);
        }
        OutputRule::Multi { outputs } => match value {
            RawValue::Scalar(_) => {
                for spec in outputs {
                    fields.insert(spec.index.clone(), field_value(label, value, spec, handlers)?);
                }
            }
            RawValue::List(values) => {
                if values.len() != outputs.len() {
                    return Err(TransformError::LengthMismatch {
                        label: label.to_string(),
                        values: values.len(),
                        outputs: outputs.len(),
                    });
                }
                for (item, spec) in values.iter().zip(outputs) {
                    let item = RawValue::from(item.as_str());
                    fields.insert(spec.index.clone(), field_value(label, &item, spec, handlers)?);
                }
            }
        },
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(yaml: &str) -> OutputRule {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn list(items: &[&str]) -> RawValue {
        RawValue::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_single_with_handler() {
        let fields = process_output(
            "VOLUME",
            &RawValue::from("IV"),
            &rule("{ type: single, index: volume, handler: numeral }"),
            &HandlerRegistry::builtin(),
        )
        .unwrap();

        assert_eq!(fields.get("volume"), Some("4"));
    }

    #[test]
    fn test_single_without_handler() {
        let fields = process_output(
            "NUMBER",
            &RawValue::from("3"),
            &rule("{ type: single, index: number }"),
            &HandlerRegistry::builtin(),
        )
        .unwrap();

        assert_eq!(fields.get("number"), Some("3"));
    }

    #[test]
    fn test_multi_broadcasts_scalar() {
        let fields = process_output(
            "VOLUME",
            &RawValue::from("XII"),
            &rule(
                r#"
type: multi
outputs:
  - index: volume_roman
  - index: volume
    handler: numeral
"#,
            ),
            &HandlerRegistry::builtin(),
        )
        .unwrap();

        assert_eq!(fields.get("volume_roman"), Some("XII"));
        assert_eq!(fields.get("volume"), Some("12"));
    }

    #[test]
    fn test_multi_zips_list() {
        let fields = process_output(
            "ISSUE",
            &list(&["IV", "March 1994"]),
            &rule(
                r#"
type: multi
outputs:
  - { index: volume, handler: numeral }
  - { index: date, handler: date, args: { format: "%Y-%m" } }
"#,
            ),
            &HandlerRegistry::builtin(),
        )
        .unwrap();

        let expected: FieldMapping = [("volume", "4"), ("date", "1994-03")].into_iter().collect();
        assert_eq!(fields, expected);
    }

    #[test]
    fn test_multi_length_mismatch() {
        let result = process_output(
            "ISSUE",
            &list(&["1", "2", "3"]),
            &rule("{ type: multi, outputs: [{ index: a }, { index: b }] }"),
            &HandlerRegistry::builtin(),
        );

        assert_eq!(
            result,
            Err(TransformError::LengthMismatch {
                label: "ISSUE".to_string(),
                values: 3,
                outputs: 2,
            })
        );
    }

    #[test]
    fn test_joiner_single_output() {
        let fields = process_output(
            "NUMBERS",
            &list(&["a", "b", "c"]),
            &rule(r#"{ type: single, index: nos, handler: joiner, args: { separator: "-", exclusions: [b] } }"#),
            &HandlerRegistry::builtin(),
        )
        .unwrap();

        assert_eq!(fields.get("nos"), Some("a-c"));
    }

    #[test]
    fn test_date_failure_is_reported() {
        let result = process_output(
            "DATE",
            &RawValue::from("someday"),
            &rule(r#"{ type: single, index: date, handler: date, args: { format: "%Y" } }"#),
            &HandlerRegistry::builtin(),
        );

        assert!(matches!(
            result,
            Err(TransformError::Handler {
                source: HandlerError::InvalidDate { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_get_value_without_handler_is_identity() {
        let value = list(&["x", "y"]);
        let spec: ValueSpec = serde_json::from_value(json!({})).unwrap();
        assert_eq!(
            get_value(&value, &spec, &HandlerRegistry::builtin()).unwrap(),
            value
        );
    }
}
