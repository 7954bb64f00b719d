use crate::error::{Result, TimelineError};
use chrono::NaiveDate;

/// Parse a date string against each format in turn.
///
/// Surrounding whitespace is ignored. Returns `None` when no format matches.
pub fn parse_date(value: &str, formats: &[String]) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Like [`parse_date`], but a miss is an error naming where the value came from.
pub fn coerce_date(value: &str, formats: &[String], context: &str) -> Result<NaiveDate> {
    parse_date(value, formats).ok_or_else(|| TimelineError::DateParse {
        value: value.trim().to_string(),
        context: context.to_string(),
    })
}
