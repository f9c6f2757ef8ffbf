// Utility helpers for parsing and display formatting.
//
// This module centralizes the "dirty" CSV/number/date handling so the rest of
// the code can assume clean, typed values.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about the
/// formatting quirks of the source spreadsheets.
///
/// The exports use continental formatting: spaces as thousands separators and
/// a comma as the decimal mark (`"1 234,56"`).
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Strips internal spaces, then maps `,` to `.`.
/// - Rejects values that contain alphabetic characters.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(' ', "").replace(',', ".");
    s.parse::<f64>().ok()
}

/// Parse a date in either `YYYY-MM-DD` or `DD/MM/YYYY` form.
///
/// Both appear in the source files depending on which tool produced the
/// export. Anything else (including blanks) is `None`; the caller decides
/// what the display fallback is.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .ok()
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Format a floating-point value with a fixed number of decimal places and
/// thousands separators (e.g., `1,234,567.89`).
pub fn format_number(n: f64, decimals: usize) -> String {
    let neg = n.is_sign_negative();
    let abs_n = n.abs();
    // First, format to a plain fixed-decimal string like `1234567.89`.
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Use `num-format` to insert commas into the integer portion.
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for row counts in console messages.
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_continental_decimals() {
        assert_eq!(parse_f64_safe(Some("1 234,56")), Some(1234.56));
        assert_eq!(parse_f64_safe(Some("1234.56")), Some(1234.56));
        assert_eq!(parse_f64_safe(Some("-17,5")), Some(-17.5));
    }

    #[test]
    fn rejects_junk_numbers() {
        assert_eq!(parse_f64_safe(None), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(Some("  ")), None);
        assert_eq!(parse_f64_safe(Some("n/a")), None);
    }

    #[test]
    fn parses_both_date_forms() {
        let d = NaiveDate::from_ymd_opt(2023, 4, 17).unwrap();
        assert_eq!(parse_date_safe(Some("2023-04-17")), Some(d));
        assert_eq!(parse_date_safe(Some("17/04/2023")), Some(d));
        assert_eq!(parse_date_safe(Some("Unplanned")), None);
        assert_eq!(parse_date_safe(None), None);
    }

    #[test]
    fn formats_numbers_with_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-42.0, 2), "-42.00");
        assert_eq!(format_number(0.0, 0), "0");
    }

    #[test]
    fn average_of_empty_is_zero() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[2.0, 4.0]), 3.0);
    }
}
