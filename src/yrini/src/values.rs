// yrini/src/values.rs

//! Typed readings of opaque values.
//!
//! The document stores every value as text. These helpers read and write the
//! handful of shapes the game itself understands.

use std::fmt::Display;

/// Read a boolean the way the engine does: only the first character counts.
///
/// `1`, `y` and `t` (any case) are true; anything else is false. Returns
/// `None` for an empty value.
pub fn parse_bool(value: &str) -> Option<bool> {
    let first = value.trim().chars().next()?;
    Some(matches!(first.to_ascii_lowercase(), '1' | 'y' | 't'))
}

/// Read an integer, ignoring surrounding whitespace.
pub fn parse_int(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

/// Read a float. A trailing `%` divides by 100, so `50%` reads as `0.5`.
pub fn parse_float(value: &str) -> Option<f64> {
    let value = value.trim();
    match value.strip_suffix('%') {
        Some(percent) => percent.trim_end().parse::<f64>().ok().map(|v| v / 100.0),
        None => value.parse().ok(),
    }
}

/// Split a comma-separated list, trimming items and skipping empty ones.
pub fn parse_list(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Write a boolean as `yes` or `no`.
pub fn format_bool(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Write a comma-separated list.
pub fn format_list<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool(" True"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("maybe"), Some(false));
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_int(" 1500 "), Some(1500));
        assert_eq!(parse_int("-3"), Some(-3));
        assert_eq!(parse_int("1.5"), None);
        assert_eq!(parse_float("0.25"), Some(0.25));
        assert_eq!(parse_float("50%"), Some(0.5));
        assert_eq!(parse_float("fast"), None);
    }

    #[test]
    fn test_lists() {
        assert_eq!(parse_list("E1, E2,,SEAL,"), vec!["E1", "E2", "SEAL"]);
        assert!(parse_list("").is_empty());
        assert_eq!(format_list(["E1", "E2"]), "E1,E2");
        assert_eq!(format_list(vec![1, 2, 3]), "1,2,3");
        assert_eq!(format_bool(true), "yes");
        assert_eq!(format_bool(false), "no");
    }
}
