use chrono::{Days, NaiveDate};

use crate::actions::errors::ActionError;

// support hyphens as well, just in case that format is used as input, even though it's not
// compliant with the DICOM standard
const DATE_SUPPORTED_FORMATS: [&str; 2] = ["%Y%m%d", "%Y-%m-%d"];

const MAX_DAYS_OFFSET: u64 = 10 * 365;

fn parse_date(value: &str) -> Result<(NaiveDate, &str, &str), ActionError> {
    DATE_SUPPORTED_FORMATS
        .iter()
        .find_map(|&format| {
            NaiveDate::parse_and_remainder(value, format)
                .ok()
                .map(|(date, remainder)| (date, remainder, format))
        })
        .ok_or_else(|| ActionError::InvalidInput(format!("unable to parse date from {}", value)))
}

/// Number of days (1 up to 3649) to shift dates by, taken from the first digits of a decimal hash.
fn days_offset(hash: &str) -> Result<u64, ActionError> {
    let digits: String = hash.chars().take(4).collect();
    let number: u64 = digits.parse().map_err(|_| {
        ActionError::InternalError(format!("hash {} is not a decimal number", hash))
    })?;

    let offset = number % MAX_DAYS_OFFSET;
    Ok(if offset == 0 { 1 } else { offset })
}

/// Moves the date at the start of `value` back by an offset derived from `hash`, keeping the
/// date format and any remainder (such as the time part of a DT value).
pub(crate) fn shift_date(value: &str, hash: &str) -> Result<String, ActionError> {
    let (date, remainder, format) = parse_date(value)?;
    let offset = days_offset(hash)?;
    let new_date = date
        .checked_sub_days(Days::new(offset))
        .ok_or_else(|| ActionError::InvalidInput(format!("date {} out of range", value)))?;
    Ok(new_date.format(format).to_string() + remainder)
}
