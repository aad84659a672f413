//! Shared parsing helpers for raw cell contents.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

// `%#z` takes `Z`, `+hh`, `+hhmm` and `+hh:mm`.
const OFFSET_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
];

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

/// Parses an ISO-8601 timestamp and keeps its calendar date.
///
/// Accepts date-times with or without seconds and with an optional offset
/// (the local date of that offset is kept), extended `YYYY-MM-DD` and basic
/// `YYYYMMDD` dates, `YYYY-MM` and bare `YYYY`.
pub fn parse_iso_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }
    if let Some(dt) = OFFSET_DATETIME_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(input, format).ok())
    {
        return Some(dt.date_naive());
    }
    if let Some(dt) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
    {
        return Some(dt.date());
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
    {
        return Some(date);
    }

    let mut parts = input.splitn(2, '-');
    let year = parts.next().filter(|y| y.len() == 4 && y.bytes().all(|b| b.is_ascii_digit()))?;
    let year: i32 = year.parse().ok()?;
    match parts.next() {
        None => NaiveDate::from_ymd_opt(year, 1, 1),
        Some(month) if month.len() == 2 => NaiveDate::from_ymd_opt(year, month.parse().ok()?, 1),
        Some(_) => None,
    }
}

/// Returns true when `input` starts with `http://` or `https://` followed by
/// anything at all. The scheme is case-sensitive and the rest is not checked.
pub fn is_http_url(input: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .filter_map(|scheme| input.strip_prefix(scheme))
        .any(|rest| !rest.is_empty())
}

/// Inclusive number of calendar years touched by `dates`; zero when empty.
pub fn year_span<I>(dates: I) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let bounds = dates.into_iter().fold(None, |acc: Option<(i32, i32)>, date| {
        let year = date.year();
        Some(acc.map_or((year, year), |(lo, hi)| (lo.min(year), hi.max(year))))
    });
    bounds.map_or(0, |(lo, hi)| (hi - lo).unsigned_abs() + 1)
}
