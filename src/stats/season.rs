//! Season normalization for loosely formatted game dates.

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// Date layouts tried in order; the first that parses wins.
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
];

/// Oldest season accepted by the digit-run fallback.
const EARLIEST_SEASON: i32 = 1900;

fn digit_run() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").expect("valid digit regex"))
}

/// Resolve the season year a date-like string belongs to.
///
/// Never fails: unparseable input falls back to the current year, which can
/// produce a plausible but wrong season for garbage input.
pub fn normalize_season(input: &str) -> i32 {
    normalize_season_at(input, Local::now().year())
}

/// Same as [`normalize_season`] with an explicit current year.
pub fn normalize_season_at(input: &str, current_year: i32) -> i32 {
    let trimmed = input.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.year();
        }
    }

    if let Some(year) = leading_digits_year(trimmed) {
        if (EARLIEST_SEASON..=current_year + 1).contains(&year) {
            return year;
        }
    }

    current_year
}

/// First four characters of the first digit run, read as a number.
fn leading_digits_year(input: &str) -> Option<i32> {
    let run = digit_run().find(input)?.as_str();
    let prefix: String = run.chars().take(4).collect();
    prefix.parse().ok()
}
