use super::{
    expect_shape, reject_unknown_args, string_arg, Handler, HandlerArgs, HandlerError,
    HandlerRegistry,
};
use crate::document::{RawValue, ValueShape};
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

/// Parses a free-form date and re-renders it with a `strftime` pattern.
///
/// Arguments: `format` (required).
pub struct DateHandler;

impl Handler for DateHandler {
    fn accepts(&self) -> ValueShape {
        ValueShape::Scalar
    }

    fn validate(&self, args: &HandlerArgs, _registry: &HandlerRegistry) -> Result<(), HandlerError> {
        reject_unknown_args("date", args, &["format"])?;
        let format = string_arg("date", args, "format")?;
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(HandlerError::InvalidArgs {
                handler: "date".to_string(),
                message: format!("invalid date format '{}'", format),
            });
        }
        Ok(())
    }

    fn transform(
        &self,
        value: &RawValue,
        args: &HandlerArgs,
        _registry: &HandlerRegistry,
    ) -> Result<String, HandlerError> {
        expect_shape("date", ValueShape::Scalar, value)?;
        let format = string_arg("date", args, "format")?;
        let text = value.as_scalar().unwrap_or_default();

        let date = parse_date(text)?;

        let mut rendered = String::new();
        write!(rendered, "{}", date.format(format)).map_err(|_| HandlerError::InvalidArgs {
            handler: "date".to_string(),
            message: format!("invalid date format '{}'", format),
        })?;
        Ok(rendered)
    }
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid date regex"))
}

/// Undo file-name tokenization and common punctuation so the remaining text
/// is either all-numeric with `-` separators or words separated by spaces.
fn normalize(value: &str) -> String {
    static ORDINAL: OnceLock<Regex> = OnceLock::new();
    static ABBREV_DOT: OnceLock<Regex> = OnceLock::new();
    static DASH: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();

    let text = value.trim().replace(',', " ");
    let text = regex(&ABBREV_DOT, r"([A-Za-z])\s*\.").replace_all(&text, "$1");
    let text = regex(&ORDINAL, r"(?i)\b(\d{1,2})\s*(st|nd|rd|th)\b").replace_all(&text, "$1");
    let text = text.replace(['/', '.'], "-");
    let text = regex(&DASH, r"\s*-\s*").replace_all(&text, "-");
    let text = regex(&SPACES, r"\s+").replace_all(&text, " ");
    text.trim().to_string()
}

fn two_digit_year(year: i32) -> i32 {
    if year < 69 {
        2000 + year
    } else {
        1900 + year
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_numeric(text: &str) -> Option<NaiveDate> {
    static Y_M_D: OnceLock<Regex> = OnceLock::new();
    static COMPACT: OnceLock<Regex> = OnceLock::new();
    static M_D_Y: OnceLock<Regex> = OnceLock::new();
    static Y_M: OnceLock<Regex> = OnceLock::new();
    static M_Y: OnceLock<Regex> = OnceLock::new();
    static Y: OnceLock<Regex> = OnceLock::new();

    let num = |s: &str| s.parse::<u32>().ok();

    if let Some(c) = regex(&Y_M_D, r"^(\d{4})-(\d{1,2})-(\d{1,2})$").captures(text) {
        return ymd(c[1].parse().ok()?, num(&c[2])?, num(&c[3])?);
    }
    if let Some(c) = regex(&COMPACT, r"^(\d{4})(\d{2})(\d{2})$").captures(text) {
        return ymd(c[1].parse().ok()?, num(&c[2])?, num(&c[3])?);
    }
    if let Some(c) = regex(&M_D_Y, r"^(\d{1,2})-(\d{1,2})-(\d{4}|\d{2})$").captures(text) {
        let year: i32 = c[3].parse().ok()?;
        let year = if c[3].len() == 2 { two_digit_year(year) } else { year };
        let (first, second) = (num(&c[1])?, num(&c[2])?);
        // Month first, unless the first field cannot be a month.
        return ymd(year, first, second).or_else(|| ymd(year, second, first));
    }
    if let Some(c) = regex(&Y_M, r"^(\d{4})-(\d{1,2})$").captures(text) {
        return ymd(c[1].parse().ok()?, num(&c[2])?, 1);
    }
    if let Some(c) = regex(&M_Y, r"^(\d{1,2})-(\d{4})$").captures(text) {
        return ymd(c[2].parse().ok()?, num(&c[1])?, 1);
    }
    if let Some(c) = regex(&Y, r"^(\d{4})$").captures(text) {
        return ymd(c[1].parse().ok()?, 1, 1);
    }
    None
}

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

const WEEKDAYS: [&str; 7] = [
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// Position of a full name or an abbreviation of at least three letters.
fn name_index(names: &[&str], word: &str) -> Option<usize> {
    let word = word.to_lowercase();
    if word.len() < 3 {
        return None;
    }
    names.iter().position(|name| name.starts_with(&word))
}

/// Dates with a month name: exactly one month word and one 4-digit year, at
/// most one 1-2 digit day and an optional weekday, in any order.
fn parse_textual(text: &str) -> Option<NaiveDate> {
    let mut year: Option<i32> = None;
    let mut month: Option<u32> = None;
    let mut day: Option<u32> = None;

    for word in text.split([' ', '-']).filter(|w| !w.is_empty()) {
        if word.chars().all(|c| c.is_ascii_digit()) {
            let duplicate = match word.len() {
                4 => year.replace(word.parse().ok()?).is_some(),
                1 | 2 => day.replace(word.parse().ok()?).is_some(),
                _ => return None,
            };
            if duplicate {
                return None;
            }
        } else if let Some(index) = name_index(&MONTHS, word) {
            if month.replace(index as u32 + 1).is_some() {
                return None;
            }
        } else if name_index(&WEEKDAYS, word).is_none() {
            return None;
        }
    }

    ymd(year?, month?, day.unwrap_or(1))
}

/// Parse a free-form date string.
///
/// Accepts ISO-like and US-style numeric dates (`1994-03-05`, `19940305`,
/// `3/5/1994`, `3/5/94`), dates with month names in any order
/// (`5 March 1994`, `March 5th, 1994`, `Mar. 5 1994`), month and year
/// (`March 1994`, `1994-03`) and a bare year. Missing parts default to the
/// first month or day.
///
/// # Example
///
/// ```
/// use multirename::handlers::parse_date;
///
/// let date = parse_date("March 5th, 1994").unwrap();
/// assert_eq!(date.to_string(), "1994-03-05");
/// ```
pub fn parse_date(value: &str) -> Result<NaiveDate, HandlerError> {
    let text = normalize(value);
    if text.is_empty() {
        return Err(HandlerError::InvalidDate {
            value: value.to_string(),
            reason: "String does not contain a date".to_string(),
        });
    }

    parse_numeric(&text)
        .or_else(|| parse_textual(&text))
        .ok_or_else(|| HandlerError::InvalidDate {
            value: value.to_string(),
            reason: "Unknown string format".to_string(),
        })
}
