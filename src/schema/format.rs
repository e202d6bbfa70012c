//! Pure display formatters behind the column kinds.

use chrono::{DateTime, NaiveDate};

use crate::sql::SqlValue;

/// Shown for a date column whose timestamp is zero or absent.
pub const DATE_PLACEHOLDER: &str = "---";

/// Currency symbol prepended to price cells.
pub const CURRENCY_SYMBOL: &str = "$";

const DATE_DISPLAY: &str = "%d-%m-%Y";
const DATE_INPUT: &str = "%Y-%m-%d";

/// Render a unix timestamp (seconds) as `DD-MM-YYYY`, UTC.
///
/// Text that already holds an ISO `YYYY-MM-DD` date is reformatted; any other
/// text is passed through untouched.
pub fn format_date(raw: &SqlValue) -> String {
    let timestamp = match raw {
        SqlValue::Null => return DATE_PLACEHOLDER.to_string(),
        SqlValue::Text(s) => {
            let s = s.trim();
            if let Ok(date) = NaiveDate::parse_from_str(s, DATE_INPUT) {
                return date.format(DATE_DISPLAY).to_string();
            }
            match s.parse::<i64>() {
                Ok(n) => n,
                Err(_) if s.is_empty() => return DATE_PLACEHOLDER.to_string(),
                Err(_) => return s.to_string(),
            }
        }
        other => other.as_i64().unwrap_or(0),
    };

    if timestamp == 0 {
        return DATE_PLACEHOLDER.to_string();
    }

    match DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format(DATE_DISPLAY).to_string(),
        None => DATE_PLACEHOLDER.to_string(),
    }
}

/// Parse a `YYYY-MM-DD` filter input into the unix timestamp of midnight UTC.
pub fn parse_date_input(s: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(s.trim(), DATE_INPUT).ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

/// Prefix the currency symbol; the amount is left as stored. NULL renders
/// empty.
pub fn format_price(raw: &SqlValue) -> String {
    if raw.is_null() {
        return String::new();
    }
    format!("{}{}", CURRENCY_SYMBOL, raw)
}

/// Join the non-empty name parts with a single space.
pub fn format_fullname(first: &SqlValue, last: &SqlValue) -> String {
    let first = first.to_string();
    let last = last.to_string();
    [first.trim(), last.trim()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a duration in seconds as `H:MM`, or `H:MM:SS` when the seconds are
/// not a whole number of minutes. Negative durations get a leading `-`.
///
/// ```
/// use reportgrid::schema::format::format_hourmins;
/// assert_eq!(format_hourmins(5400), "1:30");
/// assert_eq!(format_hourmins(3661), "1:01:01");
/// ```
pub fn format_hourmins(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let total = seconds.unsigned_abs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if secs == 0 {
        format!("{}{}:{:02}", sign, hours, minutes)
    } else {
        format!("{}{}:{:02}:{:02}", sign, hours, minutes, secs)
    }
}

/// Inverse of [`format_hourmins`].
pub fn parse_hourmins(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let parts: Vec<&str> = body.split(':').collect();
    let (hours, minutes, secs) = match parts.as_slice() {
        [h, m] => (*h, *m, "00"),
        [h, m, s] => (*h, *m, *s),
        _ => return None,
    };

    if minutes.len() != 2 || secs.len() != 2 || hours.is_empty() {
        return None;
    }
    // i128 so the magnitude of i64::MIN fits before the sign is applied
    let hours: i128 = hours.parse().ok()?;
    let minutes: i128 = minutes.parse().ok()?;
    let secs: i128 = secs.parse().ok()?;
    if hours < 0 || !(0..60).contains(&minutes) || !(0..60).contains(&secs) {
        return None;
    }

    let total = hours.checked_mul(3600)?.checked_add(minutes * 60 + secs)?;
    i64::try_from(if negative { -total } else { total }).ok()
}

/// Render a cell holding a duration in seconds; NULL renders empty.
pub fn format_hourmins_value(raw: &SqlValue) -> String {
    match raw {
        SqlValue::Null => String::new(),
        other => match other.as_i64() {
            Some(seconds) => format_hourmins(seconds),
            None => other.to_string(),
        },
    }
}
