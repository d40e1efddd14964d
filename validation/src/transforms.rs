//! Input transforms
//!
//! Normalizations applied to a raw value before it is checked against its
//! field's rules. Transforms never fail: a value they cannot handle is passed
//! through unchanged and the shape check reports it.

use serde_json::Value;

/// What `Parse` coerces a string into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTarget {
    Number,
    Boolean,
    /// `"true"`, `"false"` or `"null"`
    NullableBoolean,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    /// Trim surrounding whitespace from a string, or from every string item
    Trim,
    /// Split a string into an array of trimmed pieces
    Split(String),
    /// Coerce a string into a number or boolean
    Parse(ParseTarget),
}

impl Transform {
    pub fn split(delimiter: &str) -> Self {
        Transform::Split(delimiter.to_string())
    }

    pub fn apply(&self, value: Value) -> Value {
        match (self, value) {
            (Transform::Trim, Value::String(s)) => Value::String(trim(&s)),
            (Transform::Trim, Value::Array(items)) => Value::Array(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => Value::String(trim(&s)),
                        other => other,
                    })
                    .collect(),
            ),
            (Transform::Split(delimiter), Value::String(s)) => Value::Array(
                split(&s, delimiter)
                    .into_iter()
                    .map(Value::String)
                    .collect(),
            ),
            (Transform::Parse(ParseTarget::Number), Value::String(s)) => {
                parse_number(&s).unwrap_or(Value::String(s))
            }
            (Transform::Parse(ParseTarget::Boolean), Value::String(s)) => match s.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(s),
            },
            (Transform::Parse(ParseTarget::NullableBoolean), Value::String(s)) => match s.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" => Value::Null,
                _ => Value::String(s),
            },
            (_, other) => other,
        }
    }
}

/// Apply transforms in declaration order
pub fn apply_all(transforms: &[Transform], value: Value) -> Value {
    transforms
        .iter()
        .fold(value, |value, transform| transform.apply(value))
}

/// Trim leading and trailing whitespace from a string
pub fn trim(value: &str) -> String {
    value.trim().to_string()
}

/// Split on `delimiter`, trimming each piece. An empty string yields no pieces.
pub fn split(value: &str, delimiter: &str) -> Vec<String> {
    if value.trim().is_empty() {
        return Vec::new();
    }
    value.split(delimiter).map(trim).collect()
}

/// Parse a finite number, keeping integral values as integers so that
/// `"20"` and `20` normalize identically
pub fn parse_number(value: &str) -> Option<Value> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(Value::from(n));
    }
    if let Ok(n) = trimmed.parse::<u64>() {
        return Some(Value::from(n));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(number_value)
}

/// Canonical JSON representation of a finite number
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
