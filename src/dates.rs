use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::constants::normalize::{MAX_YEAR, MIN_YEAR};
use crate::types::Year;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%m/%d/%Y"];

/// Extract the calendar year from a date-like string.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DD[ HH:MM[:SS]]`, `YYYY/MM/DD`,
/// `DD-MM-YYYY`, `MM/DD/YYYY`, `YYYY-MM`, and a bare `YYYY`. Interval
/// notation (`2005-06-01/2005-06-03`) uses the start date. The year is read
/// as written; offsets are not converted to UTC. Returns `None` when no
/// format matches.
pub fn year_from_date_str(raw: &str) -> Option<Year> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(year) = parse_full_date(value) {
        return Some(year);
    }
    // Interval notation: only the start matters.
    let (start, _) = value.split_once('/')?;
    if start.trim().len() < 7 {
        return None;
    }
    parse_full_date(start.trim())
}

fn parse_full_date(value: &str) -> Option<Year> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return bounded(timestamp.year());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, format) {
            return bounded(timestamp.year());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return bounded(date.year());
        }
    }
    parse_year_month(value).or_else(|| parse_bare_year(value))
}

/// Parse a `YYYY-MM` string with basic month bounds checks.
fn parse_year_month(value: &str) -> Option<Year> {
    let (year, month) = value.split_once('-')?;
    if year.len() != 4 || month.is_empty() || month.len() > 2 {
        return None;
    }
    let month = month.parse::<u32>().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    parse_bare_year(year)
}

fn parse_bare_year(value: &str) -> Option<Year> {
    if value.len() != 4 || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    value.parse::<Year>().ok().and_then(bounded)
}

/// Interpret an explicit numeric year field.
///
/// Integral decimals (`2005.0`) are accepted; fractional values and years
/// outside the supported range are rejected.
pub fn explicit_year(value: f64) -> Option<Year> {
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    if value < MIN_YEAR as f64 || value > MAX_YEAR as f64 {
        return None;
    }
    Some(value as Year)
}

fn bounded(year: Year) -> Option<Year> {
    (MIN_YEAR..=MAX_YEAR).contains(&year).then_some(year)
}
