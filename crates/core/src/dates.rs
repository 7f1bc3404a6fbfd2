//! Date conversion between the backend's ISO strings and the form's `DD/MM/YYYY`.

use crate::constants::{DISPLAY_DATE_FORMAT, ISO_DATE_FORMAT, MISSING_DATE_PLACEHOLDER};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const ISO_DATE_LEN: usize = 10;

/// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:mm:ss[.f]` or an RFC 3339 timestamp into its
/// calendar date. Timestamps keep the date as written; no timezone conversion is done.
pub fn parse_iso_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.len() == ISO_DATE_LEN {
        return NaiveDate::parse_from_str(input, ISO_DATE_FORMAT).ok();
    }

    let (date_part, _) = input.split_once('T')?;
    if date_part.len() != ISO_DATE_LEN {
        return None;
    }
    let timestamp_ok = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M").is_ok()
        || DateTime::parse_from_rfc3339(input).is_ok();
    if !timestamp_ok {
        return None;
    }
    NaiveDate::parse_from_str(date_part, ISO_DATE_FORMAT).ok()
}

/// Convert an ISO date or timestamp to `DD/MM/YYYY`.
///
/// Input that does not parse is returned unchanged.
pub fn iso_to_display(input: &str) -> String {
    match parse_iso_date(input) {
        Some(date) => date.format(DISPLAY_DATE_FORMAT).to_string(),
        None => input.to_string(),
    }
}

/// Convert a `DD/MM/YYYY` form value back to `YYYY-MM-DD`.
pub fn display_to_iso(input: &str) -> Option<String> {
    let input = input.trim();
    if input.len() != ISO_DATE_LEN {
        return None;
    }
    NaiveDate::parse_from_str(input, DISPLAY_DATE_FORMAT)
        .ok()
        .map(|d| d.format(ISO_DATE_FORMAT).to_string())
}

/// Display text for an optional record timestamp: the formatted date, or `-` when the
/// backend sent nothing.
pub fn display_or_placeholder(input: Option<&str>) -> String {
    match input.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => iso_to_display(value),
        None => MISSING_DATE_PLACEHOLDER.to_string(),
    }
}
