//! Pure parser for timestamp literals.
//!
//! Offsets are honoured when present (RFC 3339, RFC 2822, or a `%z` in an explicit
//! format). Naive timestamps are placed in UTC or in the host's local zone, and
//! date-only inputs are taken at midnight.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

fn localize(naive: NaiveDateTime, assume_utc: bool) -> Option<DateTime<Utc>> {
    if assume_utc {
        Some(Utc.from_utc_datetime(&naive))
    } else {
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

fn parse_naive(text: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Parses `text` with one explicit chrono format, as requested by a
/// `datetime(<format>)` force cast.
pub fn parse_datetime_with_format(
    text: &str,
    format: &str,
    assume_utc: bool,
) -> Option<DateTime<Utc>> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_str(s, format) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_naive(s, format).and_then(|naive| localize(naive, assume_utc))
}

/// Parses `text` by trying RFC 3339, RFC 2822, then each of `formats` in order.
pub fn parse_datetime(text: &str, formats: &[String], assume_utc: bool) -> Option<DateTime<Utc>> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    formats
        .iter()
        .find_map(|format| parse_naive(s, format))
        .and_then(|naive| localize(naive, assume_utc))
}
