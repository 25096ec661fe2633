use super::{
    expect_shape, reject_unknown_args, string_arg, Handler, HandlerArgs, HandlerError,
    HandlerRegistry, ValueSpec,
};
use crate::document::{RawValue, ValueShape};
use crate::transform::get_value;
use serde_json::Value;

/// Joins a list of values with a separator.
///
/// Arguments: `separator` (required), `exclusions` (values dropped before
/// joining) and `outputs` (one value spec per element, applied before
/// joining). When `outputs` is given the list and the specs are zipped and
/// must have the same length; exclusions only apply without `outputs`.
pub struct JoinerHandler;

const NAME: &str = "joiner";
const SPEC_KEYS: [&str; 2] = ["handler", "args"];

fn exclusions(args: &HandlerArgs) -> Result<Vec<String>, HandlerError> {
    match args.get("exclusions") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.iter().map(scalar_text).collect()),
        Some(other) => Err(HandlerError::InvalidArgs {
            handler: NAME.to_string(),
            message: format!("'exclusions' must be a list, got {}", other),
        }),
    }
}

/// Exclusions may be written as YAML numbers; compare them by their text.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn element_specs(args: &HandlerArgs) -> Result<Option<Vec<ValueSpec>>, HandlerError> {
    match args.get("outputs") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            check_spec_keys(value)?;
            serde_json::from_value::<Vec<ValueSpec>>(value.clone())
            .map(Some)
            .map_err(|e| HandlerError::InvalidArgs {
                handler: NAME.to_string(),
                message: format!("'outputs' must be a list of value specs: {}", e),
            })
        }
    }
}

fn check_spec_keys(outputs: &Value) -> Result<(), HandlerError> {
    let specs = match outputs {
        Value::Array(items) => items,
        _ => return Ok(()),
    };
    for spec in specs.iter().filter_map(Value::as_object) {
        if let Some(key) = spec.keys().find(|k| !SPEC_KEYS.contains(&k.as_str())) {
            return Err(HandlerError::InvalidArgs {
                handler: NAME.to_string(),
                message: format!("unknown key '{}' in 'outputs' value spec", key),
            });
        }
    }
    Ok(())
}

impl Handler for JoinerHandler {
    fn accepts(&self) -> ValueShape {
        ValueShape::List
    }

    fn validate(&self, args: &HandlerArgs, registry: &HandlerRegistry) -> Result<(), HandlerError> {
        reject_unknown_args(NAME, args, &["separator", "exclusions", "outputs"])?;
        string_arg(NAME, args, "separator")?;
        exclusions(args)?;

        for spec in element_specs(args)?.unwrap_or_default() {
            if let Some(shape) = registry.validate_spec(&spec)? {
                if shape != ValueShape::Scalar {
                    return Err(HandlerError::ShapeMismatch {
                        handler: spec.handler.unwrap_or_default(),
                        expected: shape,
                        actual: ValueShape::Scalar,
                    });
                }
            }
        }
        Ok(())
    }

    fn transform(
        &self,
        value: &RawValue,
        args: &HandlerArgs,
        registry: &HandlerRegistry,
    ) -> Result<String, HandlerError> {
        expect_shape(NAME, ValueShape::List, value)?;
        let values = value.as_list().unwrap_or_default();
        let separator = string_arg(NAME, args, "separator")?;

        let Some(specs) = element_specs(args)? else {
            let excluded = exclusions(args)?;
            let kept: Vec<&str> = values
                .iter()
                .map(|v| v.as_str())
                .filter(|v| !excluded.iter().any(|e| e.as_str() == *v))
                .collect();
            return Ok(kept.join(separator));
        };

        if values.len() != specs.len() {
            return Err(HandlerError::LengthMismatch {
                values: values.len(),
                outputs: specs.len(),
            });
        }

        let parts = values
            .iter()
            .zip(&specs)
            .map(|(v, spec)| {
                get_value(&RawValue::from(v.as_str()), spec, registry).map(|r| r.to_string())
            })
            .collect::<Result<Vec<String>, HandlerError>>()?;
        Ok(parts.join(separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list(items: &[&str]) -> RawValue {
        RawValue::List(items.iter().map(|s| s.to_string()).collect())
    }

    fn args(value: Value) -> HandlerArgs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_join_with_exclusions() {
        let result = JoinerHandler.transform(
            &list(&["a", "b", "c"]),
            &args(json!({"separator": "-", "exclusions": ["b"]})),
            &HandlerRegistry::builtin(),
        );
        assert_eq!(result.unwrap(), "a-c");
    }

    #[test]
    fn test_numeric_exclusions_match_text() {
        let result = JoinerHandler.transform(
            &list(&["1", "and", "2"]),
            &args(json!({"separator": "_", "exclusions": ["and", 3]})),
            &HandlerRegistry::builtin(),
        );
        assert_eq!(result.unwrap(), "1_2");
    }

    #[test]
    fn test_join_with_element_outputs() {
        let result = JoinerHandler.transform(
            &list(&["IV", "7"]),
            &args(json!({
                "separator": ".",
                "outputs": [{"handler": "numeral"}, {}]
            })),
            &HandlerRegistry::builtin(),
        );
        assert_eq!(result.unwrap(), "4.7");
    }

    #[test]
    fn test_element_outputs_length_mismatch() {
        let result = JoinerHandler.transform(
            &list(&["IV", "7", "8"]),
            &args(json!({"separator": ".", "outputs": [{}, {}]})),
            &HandlerRegistry::builtin(),
        );
        assert_eq!(
            result,
            Err(HandlerError::LengthMismatch {
                values: 3,
                outputs: 2
            })
        );
    }

    #[test]
    fn test_validate() {
        let registry = HandlerRegistry::builtin();

        assert!(JoinerHandler
            .validate(&args(json!({"separator": "-"})), &registry)
            .is_ok());
        assert!(JoinerHandler.validate(&args(json!({})), &registry).is_err());
        assert!(JoinerHandler
            .validate(&args(json!({"separator": "-", "outputs": [{"handler": "nope"}]})), &registry)
            .is_err());
        assert!(JoinerHandler
            .validate(
                &args(json!({"separator": "-", "outputs": [{"handler": "joiner", "args": {"separator": ""}}]})),
                &registry
            )
            .is_err());
    }

    #[test]
    fn test_misspelled_output_key_rejected() {
        let err = JoinerHandler
            .validate(
                &args(json!({"separator": ".", "outputs": [{"hanlder": "numeral"}]})),
                &HandlerRegistry::builtin(),
            )
            .unwrap_err();

        match err {
            HandlerError::InvalidArgs { handler, message } => {
                assert_eq!(handler, "joiner");
                assert!(message.contains("'hanlder'"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_rejects_scalar() {
        let result = JoinerHandler.transform(
            &RawValue::from("abc"),
            &args(json!({"separator": "-"})),
            &HandlerRegistry::builtin(),
        );
        assert!(matches!(result, Err(HandlerError::ShapeMismatch { .. })));
    }
}
