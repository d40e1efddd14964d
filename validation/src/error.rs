//! Validation and schema construction errors
//!
//! Request-time problems are collected into a [`ValidationError`], one
//! [`FieldFailure`] per offending value. Problems with the schemas themselves
//! are [`SchemaError`]s and surface when a contract is built.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which part of the request a value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Params,
    Query,
    Body,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Params => "params",
            Location::Query => "query",
            Location::Body => "body",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A mandatory field or container was absent
    Required,
    /// A value was supplied for a field that must not be set
    Forbidden,
    /// Wrong kind of value, or a value that cannot be parsed as the kind
    Type,
    /// String did not match the declared format
    Pattern,
    /// Out of bounds: length, magnitude, date, item count or ordering
    Range,
    /// Value outside a closed set or allow-list
    Enum,
    /// Key not declared by the schema
    UnknownKey,
    TooManyKeys,
    TooFewKeys,
    /// Container must not be empty
    Empty,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Required => "required",
            FailureKind::Forbidden => "forbidden",
            FailureKind::Type => "type",
            FailureKind::Pattern => "pattern",
            FailureKind::Range => "range",
            FailureKind::Enum => "enum",
            FailureKind::UnknownKey => "unknown_key",
            FailureKind::TooManyKeys => "too_many_keys",
            FailureKind::TooFewKeys => "too_few_keys",
            FailureKind::Empty => "empty",
        }
    }
}

/// A single failed value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub location: Location,
    /// Dotted path inside the container, e.g. `name.bogus` or `attributes[2]`.
    /// Empty when the failure concerns the container itself.
    pub path: String,
    pub kind: FailureKind,
    pub message: String,
}

impl FieldFailure {
    pub fn new(
        location: Location,
        path: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            location,
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    /// `query.name.bogus`, or just `body` for container-level failures
    pub fn qualified_path(&self) -> String {
        if self.path.is_empty() {
            self.location.to_string()
        } else {
            format!("{}.{}", self.location, self.path)
        }
    }
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.qualified_path(), self.message)
    }
}

/// Aggregate of every failure found in one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("validation failed with {} failure(s)", .failures.len())]
pub struct ValidationError {
    failures: Vec<FieldFailure>,
}

impl ValidationError {
    pub fn new(failures: Vec<FieldFailure>) -> Self {
        Self { failures }
    }

    pub fn single(
        location: Location,
        path: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            failures: vec![FieldFailure::new(location, path, kind, message)],
        }
    }

    pub fn failures(&self) -> &[FieldFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<FieldFailure> {
        self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// First failure recorded for `path` inside `location`
    pub fn find(&self, location: Location, path: &str) -> Option<&FieldFailure> {
        self.failures
            .iter()
            .find(|f| f.location == location && f.path == path)
    }
}

/// An internally inconsistent schema. Raised while building contracts, never
/// while validating a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("field '{field}': minimum {min} exceeds maximum {max}")]
    InvertedBounds {
        field: String,
        min: String,
        max: String,
    },

    #[error("field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("field '{field}': invalid pattern: {reason}")]
    InvalidPattern { field: String, reason: String },

    #[error("field '{field}': default value is invalid: {reason}")]
    InvalidDefault { field: String, reason: String },

    #[error("field '{field}': operator '{operator}' does not apply to {kind} values")]
    InapplicableOperator {
        field: String,
        operator: String,
        kind: String,
    },

    #[error("contract: {0}")]
    InvalidContract(String),
}

impl SchemaError {
    pub(crate) fn field(field: &str, reason: impl Into<String>) -> Self {
        SchemaError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn inverted(field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        SchemaError::InvertedBounds {
            field: field.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }
}
