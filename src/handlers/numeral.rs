use super::{expect_shape, reject_unknown_args, Handler, HandlerArgs, HandlerError, HandlerRegistry};
use crate::document::{RawValue, ValueShape};

/// Roman numeral to decimal conversion; numeric input passes through.
pub struct NumeralHandler;

impl Handler for NumeralHandler {
    fn accepts(&self) -> ValueShape {
        ValueShape::Scalar
    }

    fn validate(&self, args: &HandlerArgs, _registry: &HandlerRegistry) -> Result<(), HandlerError> {
        reject_unknown_args("numeral", args, &[])
    }

    fn transform(
        &self,
        value: &RawValue,
        _args: &HandlerArgs,
        _registry: &HandlerRegistry,
    ) -> Result<String, HandlerError> {
        expect_shape("numeral", ValueShape::Scalar, value)?;
        let text = value.as_scalar().unwrap_or_default();

        if !text.is_empty() && text.chars().all(char::is_numeric) {
            return Ok(text.to_string());
        }

        Ok(roman_to_int(text)?.to_string())
    }
}

fn digit_value(c: char) -> Option<i64> {
    match c.to_ascii_uppercase() {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    }
}

/// Convert a Roman numeral to its integer value, case-insensitively.
///
/// Digits are summed left to right; a digit immediately followed by a
/// strictly larger digit is subtracted instead.
///
/// # Example
///
/// ```
/// use multirename::handlers::roman_to_int;
///
/// assert_eq!(roman_to_int("MCMXCIV").unwrap(), 1994);
/// assert_eq!(roman_to_int("iv").unwrap(), 4);
/// ```
pub fn roman_to_int(numeral: &str) -> Result<i64, HandlerError> {
    let digits = numeral
        .chars()
        .map(|c| digit_value(c).ok_or_else(|| HandlerError::InvalidNumeral(numeral.to_string())))
        .collect::<Result<Vec<i64>, HandlerError>>()?;

    let total: i64 = digits
        .iter()
        .enumerate()
        .map(|(i, &value)| match digits.get(i + 1) {
            Some(&next) if value < next => -value,
            _ => value,
        })
        .sum();

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeral(value: &str) -> Result<String, HandlerError> {
        NumeralHandler.transform(
            &RawValue::from(value),
            &HandlerArgs::new(),
            &HandlerRegistry::builtin(),
        )
    }

    #[test]
    fn test_subtractive_pairs() {
        assert_eq!(roman_to_int("IV").unwrap(), 4);
        assert_eq!(roman_to_int("IX").unwrap(), 9);
        assert_eq!(roman_to_int("XL").unwrap(), 40);
        assert_eq!(roman_to_int("MCMXCIV").unwrap(), 1994);
        assert_eq!(roman_to_int("MMXXIV").unwrap(), 2024);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(numeral("xiv").unwrap(), "14");
        assert_eq!(numeral("Vi").unwrap(), "6");
    }

    #[test]
    fn test_numeric_passthrough() {
        assert_eq!(numeral("7").unwrap(), "7");
        assert_eq!(numeral("0012").unwrap(), "0012");
    }

    #[test]
    fn test_invalid_numeral() {
        assert_eq!(
            numeral("IVa"),
            Err(HandlerError::InvalidNumeral("IVa".to_string()))
        );
    }

    #[test]
    fn test_rejects_list() {
        let result = NumeralHandler.transform(
            &RawValue::List(vec!["IV".to_string()]),
            &HandlerArgs::new(),
            &HandlerRegistry::builtin(),
        );
        assert!(matches!(result, Err(HandlerError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_rejects_arguments() {
        let mut args = HandlerArgs::new();
        args.insert("base".to_string(), serde_json::json!(10));
        assert!(NumeralHandler
            .validate(&args, &HandlerRegistry::builtin())
            .is_err());
    }
}
