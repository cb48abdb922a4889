// Date/time text to epoch milliseconds

use chrono::{NaiveDate, NaiveDateTime};

const ISO_DATETIME: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const MONTH_FIRST: &[&str] = &["%m/%d/%Y %H:%M:%S%.f", "%m/%d/%Y %H:%M"];
const DAY_FIRST: &[&str] = &["%d/%m/%Y %H:%M:%S%.f", "%d/%m/%Y %H:%M"];

/// Parse a date or timestamp into milliseconds since the Unix epoch.
///
/// Accepts ISO-8601 style `YYYY-MM-DD[( |T)HH:MM[:SS[.fff]]]` and slash
/// separated `MM/DD/YYYY` (or `DD/MM/YYYY` when `dayfirst`) with the same
/// optional time part.
pub fn parse_timestamp_ms(text: &[u8], dayfirst: bool) -> Option<i64> {
    let text = std::str::from_utf8(text.trim_ascii()).ok()?;
    // every accepted shape is at least 8 bytes and starts with a digit
    if text.len() < 8 || !text.as_bytes()[0].is_ascii_digit() {
        return None;
    }

    let (datetimes, date_fmt): (&[&str], &str) = if text.contains('/') {
        if dayfirst {
            (DAY_FIRST, "%d/%m/%Y")
        } else {
            (MONTH_FIRST, "%m/%d/%Y")
        }
    } else if text.contains('-') {
        (ISO_DATETIME, "%Y-%m-%d")
    } else {
        return None;
    };

    if let Ok(date) = NaiveDate::parse_from_str(text, date_fmt) {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    datetimes
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.and_utc().timestamp_millis())
}
