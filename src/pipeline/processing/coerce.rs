//! Field coercers: single-cell parsing and cleanup helpers shared by the
//! validator and the enricher. None of these ever fail loudly; a value that
//! cannot be coerced comes back as `None` (or an empty string).

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{DATE_FORMATS, MIN_PHONE_DIGITS};

static NON_WORD_OR_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("static regex is valid"));

/// Anchored shape of each entry in `DATE_FORMATS`. chrono's `%Y` takes a
/// signed year of any width; a year here is exactly four digits.
static DATE_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| {
    DATE_FORMATS
        .iter()
        .map(|fmt| Regex::new(&layout_pattern(fmt)).expect("date layout compiles to a valid pattern"))
        .collect()
});

fn layout_pattern(fmt: &str) -> String {
    let mut pattern = String::from("^");
    let mut chars = fmt.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            pattern.push_str(&regex::escape(&c.to_string()));
            continue;
        }
        match chars.next() {
            Some('Y') => pattern.push_str(r"\d{4}"),
            Some('m' | 'd' | 'H' | 'I' | 'M' | 'S') => pattern.push_str(r"\d{1,2}"),
            Some('p') => pattern.push_str("(?i:am|pm)"),
            Some(other) => pattern.push_str(&regex::escape(&format!("%{}", other))),
            None => pattern.push_str("%"),
        }
    }
    pattern.push('$');
    pattern
}

/// Parse an order date with the first matching layout in `DATE_FORMATS`.
/// Any time of day is dropped.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .zip(DATE_SHAPES.iter())
        .filter(|(_, shape)| shape.is_match(value))
        .find_map(|(fmt, _)| {
            if fmt.contains("%H") || fmt.contains("%I") {
                NaiveDateTime::parse_from_str(value, fmt)
                    .ok()
                    .map(|dt| dt.date())
            } else {
                NaiveDate::parse_from_str(value, fmt).ok()
            }
        })
}

/// Parse a number, accepting sign, fraction and exponent forms.
/// Non-finite values (`nan`, `inf`) are not numbers here.
pub fn parse_numeric(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
}

pub fn is_numeric(value: &str) -> bool {
    parse_numeric(value).is_some()
}

/// True for a non-empty run of ASCII digits, nothing else
pub fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Drop every character that is neither a word character nor whitespace,
/// then trim.
pub fn sanitize_text(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    NON_WORD_OR_SPACE.replace_all(value, "").trim().to_string()
}

/// Keep only the digits; fewer than seven digits is not a phone number
pub fn sanitize_phone(value: &str) -> Option<String> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() >= MIN_PHONE_DIGITS {
        Some(digits)
    } else {
        None
    }
}

/// First `limit` characters (not bytes)
pub fn truncate_chars(value: &str, limit: usize) -> String {
    value.chars().take(limit).collect()
}

/// Round half away from zero to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::OUTPUT_DATE_FORMAT;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_accepts_every_layout() {
        assert_eq!(parse_date("2024-01-15"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("2024/01/15"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("01/15/2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("2/24/2003 0:00"), Some(ymd(2003, 2, 24)));
        assert_eq!(parse_date("2/24/2003 13:05:09"), Some(ymd(2003, 2, 24)));
        assert_eq!(parse_date("2/24/2003 9:30 PM"), Some(ymd(2003, 2, 24)));
        assert_eq!(parse_date("  2024-01-15  "), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn test_parse_date_prefers_month_first_when_ambiguous() {
        // 03/04 could be either; month-first wins by layout order
        assert_eq!(parse_date("03/04/2024"), Some(ymd(2024, 3, 4)));
        // 25 cannot be a month, so the day-first layout matches
        assert_eq!(parse_date("25/04/2024"), Some(ymd(2024, 4, 25)));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date("2024-01-15T10:00:00"), None);
    }

    #[test]
    fn test_parse_date_requires_four_digit_year() {
        assert_eq!(parse_date("1/5/24"), None);
        assert_eq!(parse_date("12/31/99"), None);
        assert_eq!(parse_date("24-01-15"), None);
        assert_eq!(parse_date("+2024-01-15"), None);
        assert_eq!(parse_date("-2024-01-15"), None);
        assert_eq!(parse_date("12/31/99 10:00"), None);
        assert_eq!(parse_date("12024-01-15"), None);
    }

    #[test]
    fn test_layout_pattern_shapes() {
        let iso = Regex::new(&layout_pattern("%Y-%m-%d")).unwrap();
        assert!(iso.is_match("2024-1-5"));
        assert!(!iso.is_match("2024-01-15 "));
        assert!(!iso.is_match("202-01-15"));

        let meridiem = Regex::new(&layout_pattern("%m/%d/%Y %I:%M %p")).unwrap();
        assert!(meridiem.is_match("2/24/2003 9:30 pm"));
        assert!(!meridiem.is_match("2/24/03 9:30 PM"));
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("10"));
        assert!(is_numeric("-3.5"));
        assert!(is_numeric(".5"));
        assert!(is_numeric("1e3"));
        assert!(is_numeric(" 2.25 "));
        assert!(!is_numeric(""));
        assert!(!is_numeric("abc"));
        assert!(!is_numeric("1,000"));
        assert!(!is_numeric("nan"));
        assert!(!is_numeric("inf"));
    }

    #[test]
    fn test_is_digits() {
        assert!(is_digits("10107"));
        assert!(!is_digits(""));
        assert!(!is_digits("-1"));
        assert!(!is_digits("1.0"));
        assert!(!is_digits(" 12"));
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("México!!"), "México");
        assert_eq!(sanitize_text("  O'Hara, Jr. "), "OHara Jr");
        assert_eq!(sanitize_text("Small_Deal"), "Small_Deal");
        assert_eq!(sanitize_text("!!!"), "");
        assert_eq!(sanitize_text(""), "");
    }

    #[test]
    fn test_sanitize_phone() {
        assert_eq!(sanitize_phone("+1 (212) 555-7818"), Some("12125557818".to_string()));
        assert_eq!(sanitize_phone("40.67.8555"), Some("40678555".to_string()));
        assert_eq!(sanitize_phone("555-12"), None);
        assert_eq!(sanitize_phone(""), None);
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("S10_1678", 15), "S10_1678");
        assert_eq!(truncate_chars("ABCDEFGHIJKLMNOPQ", 15), "ABCDEFGHIJKLMNO");
        assert_eq!(truncate_chars("ñññ", 2), "ññ");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(50.0), 50.0);
        assert_eq!(round2(2871.0), 2871.0);
        assert_eq!(round2(33.333), 33.33);
        assert_eq!(round2(0.125), 0.13);
    }

    proptest! {
        #[test]
        fn prop_sanitize_text_is_idempotent(s in "\\PC*") {
            let once = sanitize_text(&s);
            prop_assert_eq!(sanitize_text(&once), once);
        }

        #[test]
        fn prop_parsed_date_reparses_as_iso(y in 1900i32..2100, m in 1u32..=12, d in 1u32..=28) {
            let input = format!("{}/{}/{}", m, d, y);
            let parsed = parse_date(&input).unwrap();
            let iso = parsed.format(OUTPUT_DATE_FORMAT).to_string();
            let reparsed = NaiveDate::parse_from_str(&iso, OUTPUT_DATE_FORMAT).unwrap();
            prop_assert_eq!(reparsed, parsed);
            prop_assert_eq!(parse_date(&iso), Some(parsed));
        }
    }
}
