//! Field extraction helpers shared by the state transformers.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static ZIP5: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{5}").unwrap());
static STATE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]{2}").unwrap());

/// Output date format for every record.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%m/%d/%y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d-%b-%Y",
];

/// First run of five digits, if any.
pub fn first_zip5(text: &str) -> Option<&str> {
    ZIP5.find(text).map(|m| m.as_str())
}

/// First pair of uppercase letters, if any.
pub fn first_state_code(text: &str) -> Option<&str> {
    STATE_CODE.find(text).map(|m| m.as_str())
}

/// Trim and drop trailing commas (`"Tampa, "` -> `"Tampa"`).
pub fn strip_trailing_comma(text: &str) -> &str {
    text.trim().trim_end_matches(',')
}

/// Parse a strict `MM/DD/YYYY` date (zero padding optional).
pub fn parse_mdy(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

/// Parse a date in any of the shapes registry exports use.
pub fn parse_flexible_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    // `%Y` also accepts two-digit years; those belong to `%y`.
    let plausible = |d: &NaiveDate| d.year() >= 1000;
    DATETIME_FORMATS
        .iter()
        .filter_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .map(|dt| dt.date())
        .find(plausible)
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .filter_map(|f| NaiveDate::parse_from_str(text, f).ok())
                .find(plausible)
        })
}

/// Reformat any recognised date as `MM/DD/YYYY`; empty when unrecognised.
pub fn to_mdy(text: &str) -> String {
    parse_flexible_date(text)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_zip5() {
        assert_eq!(first_zip5("FL 33101-1234"), Some("33101"));
        assert_eq!(first_zip5("25301.0"), Some("25301"));
        assert_eq!(first_zip5("1234"), None);
    }

    #[test]
    fn test_first_state_code() {
        assert_eq!(first_state_code(" WA"), Some("WA"));
        assert_eq!(first_state_code("wa 98155"), None);
    }

    #[test]
    fn test_strip_trailing_comma() {
        assert_eq!(strip_trailing_comma("  Tampa,  "), "Tampa");
        assert_eq!(strip_trailing_comma("Tampa"), "Tampa");
    }

    #[test]
    fn test_parse_mdy() {
        assert_eq!(parse_mdy("08/15/2024"), NaiveDate::from_ymd_opt(2024, 8, 15));
        assert_eq!(parse_mdy(" 8/5/2024 "), NaiveDate::from_ymd_opt(2024, 8, 5));
        assert_eq!(parse_mdy("2024-08-15"), None);
        assert_eq!(parse_mdy("13/45/2024"), None);
    }

    #[test]
    fn test_to_mdy_shapes() {
        for input in [
            "1/2/2020",
            "01/02/2020 12:00:00 AM",
            "2020-01-02",
            "2020-01-02 00:00:00",
            "2020-01-02T08:30:00",
            "2020-01-02T08:30:00Z",
            "Jan 2, 2020",
            "January 2, 2020",
            "02-Jan-2020",
        ] {
            assert_eq!(to_mdy(input), "01/02/2020", "input {input}");
        }
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(to_mdy("1/2/20"), "01/02/2020");
        assert_eq!(to_mdy("1/2/99"), "01/02/1999");
    }

    #[test]
    fn test_to_mdy_unparseable_is_empty() {
        assert_eq!(to_mdy("not a date"), "");
        assert_eq!(to_mdy(""), "");
    }
}
