//! Image creation timestamp parsing.
//!
//! Image config blobs record their creation time in a `created` field that
//! is nominally RFC 3339. Some build tools write a truncated offset whose
//! minute component has only one digit, which strict parsers reject:
//!
//! | raw                              | normalized                        |
//! |----------------------------------|-----------------------------------|
//! | `2024-01-02T03:04:05+05:3`       | `2024-01-02T03:04:05+05:03`       |
//! | `2024-01-02T03:04:05.123-07:5`   | `2024-01-02T03:04:05.123-07:05`   |
//! | `2024-01-02T03:04:05+05:30`      | unchanged                         |
//! | `2024-01-02T03:04:05.999999999Z` | unchanged                         |
//!
//! Values without any offset are taken to be UTC.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::error::{Error, Result};

/// Pads a single-digit offset minute with a leading zero.
///
/// Returns the input unchanged when it does not end in `[+-]HH:M`.
///
/// # Examples
///
/// ```rust
/// use regprune_core::timestamp::normalize_offset;
///
/// assert_eq!(normalize_offset("2024-01-02T03:04:05+05:3"), "2024-01-02T03:04:05+05:03");
/// assert_eq!(normalize_offset("2024-01-02T03:04:05Z"), "2024-01-02T03:04:05Z");
/// ```
#[must_use]
pub fn normalize_offset(raw: &str) -> Cow<'_, str> {
    let bytes = raw.as_bytes();
    let len = bytes.len();
    if len < 7 || (!raw.contains('T') && !raw.contains('t')) {
        return Cow::Borrowed(raw);
    }

    // <digit> <sign> H H : M
    let tail = &bytes[len - 6..];
    let truncated = tail[0].is_ascii_digit()
        && matches!(tail[1], b'+' | b'-')
        && tail[2].is_ascii_digit()
        && tail[3].is_ascii_digit()
        && tail[4] == b':'
        && tail[5].is_ascii_digit();

    if !truncated {
        return Cow::Borrowed(raw);
    }

    let (head, minute) = raw.split_at(len - 1);
    Cow::Owned(format!("{head}0{minute}"))
}

/// Parses a `created` value into a timezone-aware timestamp.
///
/// # Errors
///
/// Returns [`Error::InvalidTimestamp`] if the value is not a recognizable
/// date-time even after offset normalization.
///
/// # Examples
///
/// ```rust
/// use regprune_core::timestamp::parse_created;
///
/// let ts = parse_created("2024-01-02T03:04:05+05:3").unwrap();
/// assert_eq!(ts.offset().local_minus_utc(), 5 * 3600 + 3 * 60);
///
/// let naive = parse_created("2024-01-02T03:04:05").unwrap();
/// assert_eq!(naive.offset().local_minus_utc(), 0);
/// ```
pub fn parse_created(raw: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidTimestamp {
            value: raw.to_string(),
            reason: "value is empty".to_string(),
        });
    }

    let normalized = normalize_offset(trimmed);

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(parsed);
    }

    // Offsets written without a colon, e.g. +0530.
    if let Ok(parsed) = DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(parsed);
    }

    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|e| Error::InvalidTimestamp {
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pads_positive_offset() {
        assert_eq!(
            normalize_offset("2024-01-02T03:04:05+05:3"),
            "2024-01-02T03:04:05+05:03"
        );
    }

    #[test]
    fn test_normalize_pads_negative_offset_with_fraction() {
        assert_eq!(
            normalize_offset("2024-01-02T03:04:05.123-07:5"),
            "2024-01-02T03:04:05.123-07:05"
        );
    }

    #[test]
    fn test_normalize_requires_time_separator() {
        assert_eq!(
            normalize_offset("2024-01-02t03:04:05+05:3"),
            "2024-01-02t03:04:05+05:03"
        );
        for value in ["2024-01-02 03:04:05+05:3", "T+05:3", "9+05:3"] {
            assert!(matches!(normalize_offset(value), Cow::Borrowed(_)), "{value}");
        }
    }

    #[test]
    fn test_normalize_leaves_well_formed_values() {
        for value in [
            "2024-01-02T03:04:05+05:30",
            "2024-01-02T03:04:05Z",
            "2024-01-02T03:04:05",
            "2024-01-02",
            "",
        ] {
            assert!(matches!(normalize_offset(value), Cow::Borrowed(_)), "{value}");
        }
    }

    #[test]
    fn test_parse_utc_with_nanoseconds() {
        let ts = parse_created("2023-11-14T09:30:12.123456789Z").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 0);
        assert_eq!(ts.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn test_parse_malformed_offset_is_corrected() {
        let ts = parse_created("2024-01-02T03:04:05+05:3").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 5 * 3600 + 3 * 60);
        assert_eq!(ts.to_rfc3339(), "2024-01-02T03:04:05+05:03");
    }

    #[test]
    fn test_parse_well_formed_offset() {
        let ts = parse_created("2024-01-02T03:04:05-04:00").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), -4 * 3600);
    }

    #[test]
    fn test_parse_offset_without_colon() {
        let ts = parse_created("2024-01-02T03:04:05+0530").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
    }

    #[test]
    fn test_parse_naive_is_utc() {
        let ts = parse_created("2024-01-02T03:04:05.5").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 0);
        assert_eq!(ts.to_rfc3339(), "2024-01-02T03:04:05.500+00:00");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert!(parse_created("  2024-01-02T03:04:05Z\n").is_ok());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_created("last tuesday"),
            Err(Error::InvalidTimestamp { .. })
        ));
        assert!(matches!(parse_created(""), Err(Error::InvalidTimestamp { .. })));
    }
}
