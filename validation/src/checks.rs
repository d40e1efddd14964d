//! Primitive value checks
//!
//! Small reusable checks over already-typed values. Each returns a
//! human-readable message on failure; the validator decides the failure kind.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use uuid::{Uuid, Variant};

lazy_static! {
    /// HTML tag detection pattern
    static ref HTML_TAG_REGEX: Regex = Regex::new(r"<[^>]+>").unwrap();

    /// Script/event handler pattern for XSS detection
    static ref XSS_PATTERN_REGEX: Regex = Regex::new(
        r"(?i)(javascript:|on\w+\s*=|<script|<iframe|<object|<embed)"
    ).unwrap();

    /// Canonical hyphenated UUID layout
    static ref UUID_LAYOUT_REGEX: Regex = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    ).unwrap();
}

/// Validate string length within bounds
pub fn validate_length(value: &str, min: Option<usize>, max: Option<usize>) -> Result<(), String> {
    let len = value.chars().count();
    if let Some(min) = min {
        if len < min {
            return Err(format!("must be at least {} characters", min));
        }
    }
    if let Some(max) = max {
        if len > max {
            return Err(format!("must be at most {} characters", max));
        }
    }
    Ok(())
}

pub fn validate_exact_length(value: &str, length: usize) -> Result<(), String> {
    if value.chars().count() != length {
        return Err(format!("must be exactly {} characters", length));
    }
    Ok(())
}

/// Validate that a string contains no HTML tags or script patterns
pub fn validate_no_markup(value: &str) -> Result<(), String> {
    if HTML_TAG_REGEX.is_match(value) {
        return Err("must not contain HTML tags".to_string());
    }
    if XSS_PATTERN_REGEX.is_match(value) {
        return Err("contains potentially unsafe content".to_string());
    }
    Ok(())
}

pub fn validate_member(value: &str, allowed: &[String]) -> Result<(), String> {
    if allowed.iter().any(|a| a == value) {
        Ok(())
    } else {
        Err(format!("must be one of [{}]", allowed.join(", ")))
    }
}

/// Parse a hyphenated UUID of the given version and return its canonical
/// lowercase form
pub fn parse_uuid(value: &str, version: Option<usize>) -> Result<String, String> {
    let expected = match version {
        Some(v) => format!("must be a valid UUID v{}", v),
        None => "must be a valid UUID".to_string(),
    };

    if !UUID_LAYOUT_REGEX.is_match(value) {
        return Err(expected);
    }
    let uuid = Uuid::try_parse(value).map_err(|_| expected.clone())?;
    if uuid.get_variant() != Variant::RFC4122 {
        return Err(expected);
    }
    if let Some(v) = version {
        if uuid.get_version_num() != v {
            return Err(expected);
        }
    }
    Ok(uuid.hyphenated().to_string())
}

/// Parse an RFC 3339 timestamp, a `YYYY-MM-DD` date (midnight UTC) or epoch
/// milliseconds
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            if let Ok(at) = DateTime::parse_from_rfc3339(s) {
                return Some(at.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Canonical date representation: RFC 3339 in UTC with millisecond digits.
/// Finer fractions are written out in full rather than truncated.
pub fn format_date(at: DateTime<Utc>) -> String {
    let format = if at.timestamp_subsec_nanos() % 1_000_000 == 0 {
        SecondsFormat::Millis
    } else {
        SecondsFormat::AutoSi
    };
    at.to_rfc3339_opts(format, true)
}

pub fn validate_number_range(value: f64, min: Option<f64>, max: Option<f64>) -> Result<(), String> {
    if let Some(min) = min {
        if value < min {
            return Err(format!("must be at least {}", min));
        }
    }
    if let Some(max) = max {
        if value > max {
            return Err(format!("must be at most {}", max));
        }
    }
    Ok(())
}

pub fn validate_date_range(
    value: DateTime<Utc>,
    earliest: Option<DateTime<Utc>>,
    latest: Option<DateTime<Utc>>,
) -> Result<(), String> {
    if let Some(earliest) = earliest {
        if value < earliest {
            return Err(format!("must not be before {}", format_date(earliest)));
        }
    }
    if let Some(latest) = latest {
        if value > latest {
            return Err(format!("must not be after {}", format_date(latest)));
        }
    }
    Ok(())
}

/// Order two normalized scalars of the same kind
pub fn compare_scalars(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_length() {
        assert!(validate_length("hello", Some(1), Some(10)).is_ok());
        assert!(validate_length("", Some(1), Some(10)).is_err());
        assert!(validate_length("hello world!", Some(1), Some(5)).is_err());
        assert!(validate_length("ñandú", Some(5), Some(5)).is_ok());
    }

    #[test]
    fn test_validate_no_markup() {
        assert!(validate_no_markup("plain text").is_ok());
        assert!(validate_no_markup("%abc%").is_ok());
        assert!(validate_no_markup("<b>bold</b>").is_err());
        assert!(validate_no_markup("javascript:alert(1)").is_err());
        assert!(validate_no_markup("onclick=alert(1)").is_err());
    }

    #[test]
    fn test_parse_uuid() {
        let v4 = "3F2504E0-4F89-41D3-9A0C-0305E82C3301";
        assert_eq!(
            parse_uuid(v4, Some(4)).unwrap(),
            "3f2504e0-4f89-41d3-9a0c-0305e82c3301"
        );

        // version 1
        assert!(parse_uuid("c232ab00-9414-11ec-b3c8-9f6bdeced846", Some(4)).is_err());
        // simple form without hyphens
        assert!(parse_uuid("3f2504e04f8941d39a0c0305e82c3301", Some(4)).is_err());
        assert!(parse_uuid("not-a-uuid", Some(4)).is_err());
    }

    #[test]
    fn test_parse_date() {
        let at = parse_date(&json!("2024-03-01T10:30:00+02:00")).unwrap();
        assert_eq!(format_date(at), "2024-03-01T08:30:00.000Z");

        let day = parse_date(&json!("2024-03-01")).unwrap();
        assert_eq!(format_date(day), "2024-03-01T00:00:00.000Z");

        let millis = parse_date(&json!(0)).unwrap();
        assert_eq!(format_date(millis), "1970-01-01T00:00:00.000Z");

        let fine = parse_date(&json!("2024-03-01T00:00:00.0005Z")).unwrap();
        assert_eq!(format_date(fine), "2024-03-01T00:00:00.000500Z");
        let nanos = parse_date(&json!("2024-03-01T00:00:00.123456789Z")).unwrap();
        assert_eq!(format_date(nanos), "2024-03-01T00:00:00.123456789Z");

        assert!(parse_date(&json!("yesterday")).is_none());
        assert!(parse_date(&json!(true)).is_none());
    }

    #[test]
    fn test_validate_number_range() {
        assert!(validate_number_range(5.0, Some(0.0), Some(10.0)).is_ok());
        assert_eq!(
            validate_number_range(101.0, None, Some(100.0)).unwrap_err(),
            "must be at most 100"
        );
    }

    #[test]
    fn test_compare_scalars() {
        use std::cmp::Ordering;
        assert_eq!(compare_scalars(&json!(1), &json!(2.5)), Some(Ordering::Less));
        assert_eq!(compare_scalars(&json!("b"), &json!("a")), Some(Ordering::Greater));
        assert_eq!(compare_scalars(&json!("a"), &json!(1)), None);
    }
}
