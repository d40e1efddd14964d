//! Object schemas and request contracts

use std::collections::BTreeMap;

use super::field::{FieldSchema, Presence};
use crate::error::SchemaError;

/// What to do with keys the schema does not declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Each undeclared key is an `UnknownKey` failure
    #[default]
    Reject,
    /// Undeclared keys are dropped silently and not counted
    Strip,
}

/// Aggregate constraints for a contract container
#[derive(Debug, Clone, Default)]
pub struct ContractLimits {
    pub max_keys: Option<usize>,
    pub min_keys: Option<usize>,
    pub unknown_keys: UnknownKeys,
    /// `None` keeps the container's own default
    pub allow_empty: Option<bool>,
}

/// Named mapping of keys to field schemas plus aggregate constraints
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    fields: BTreeMap<String, FieldSchema>,
    duplicates: Vec<String>,
    required: bool,
    min_keys: Option<usize>,
    max_keys: Option<usize>,
    length: Option<usize>,
    unknown_keys: UnknownKeys,
    allow_empty: bool,
}

impl ObjectSchema {
    /// Unchecked object; becomes usable once sealed by its contract
    pub fn from_fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldSchema)>,
        K: Into<String>,
    {
        let mut map = BTreeMap::new();
        let mut duplicates = Vec::new();
        for (key, field) in fields {
            let key = key.into();
            if map.contains_key(&key) {
                duplicates.push(key.clone());
            }
            map.insert(key, field);
        }

        Self {
            fields: map,
            duplicates,
            required: true,
            min_keys: None,
            max_keys: None,
            length: None,
            unknown_keys: UnknownKeys::Reject,
            allow_empty: true,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.fields.get(key)
    }

    pub fn declares(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn min_keys(&self) -> Option<usize> {
        self.min_keys
    }

    pub fn max_keys(&self) -> Option<usize> {
        self.max_keys
    }

    /// Exact number of keys, used for path parameters
    pub fn length(&self) -> Option<usize> {
        self.length
    }

    pub fn unknown_keys(&self) -> UnknownKeys {
        self.unknown_keys
    }

    pub fn allow_empty(&self) -> bool {
        self.allow_empty
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_min_keys(mut self, n: usize) -> Self {
        self.min_keys = Some(n);
        self
    }

    pub fn with_max_keys(mut self, n: usize) -> Self {
        self.max_keys = Some(n);
        self
    }

    pub fn with_length(mut self, n: usize) -> Self {
        self.length = Some(n);
        self
    }

    pub fn with_unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.unknown_keys = policy;
        self
    }

    pub fn with_allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    fn with_limits(mut self, limits: &ContractLimits) -> Self {
        self.max_keys = limits.max_keys.or(self.max_keys);
        self.min_keys = limits.min_keys.or(self.min_keys);
        self.unknown_keys = limits.unknown_keys;
        if let Some(allow) = limits.allow_empty {
            self.allow_empty = allow;
        }
        self
    }

    /// Check aggregate constraints and seal every field
    pub fn seal(self, name: &str) -> Result<ObjectSchema, SchemaError> {
        if let Some(key) = self.duplicates.first() {
            return Err(SchemaError::InvalidContract(format!(
                "{}: key '{}' is declared twice",
                name, key
            )));
        }

        if let (Some(min), Some(max)) = (self.min_keys, self.max_keys) {
            if min > max {
                return Err(SchemaError::inverted(name, min, max));
            }
        }

        let declared = self.fields.len();
        let required = self
            .fields
            .values()
            .filter(|f| f.presence() == Presence::Required)
            .count();

        if let Some(max) = self.max_keys {
            if required > max {
                return Err(SchemaError::InvalidContract(format!(
                    "{}: {} required keys can never fit under max_keys {}",
                    name, required, max
                )));
            }
        }
        if let Some(min) = self.min_keys {
            if min > declared {
                return Err(SchemaError::InvalidContract(format!(
                    "{}: min_keys {} exceeds the {} declared keys",
                    name, min, declared
                )));
            }
        }
        if let Some(length) = self.length {
            if length != declared {
                return Err(SchemaError::InvalidContract(format!(
                    "{}: expected exactly {} keys but {} are declared",
                    name, length, declared
                )));
            }
        }

        let mut fields = BTreeMap::new();
        for (key, field) in self.fields {
            let path = if name.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", name, key)
            };
            let sealed = field.seal(&path)?;
            fields.insert(key, sealed);
        }

        Ok(ObjectSchema { fields, ..self })
    }
}

/// Contract for query strings. Empty queries are accepted.
pub fn query_contract<I, K>(fields: I, limits: ContractLimits) -> Result<ObjectSchema, SchemaError>
where
    I: IntoIterator<Item = (K, FieldSchema)>,
    K: Into<String>,
{
    ObjectSchema::from_fields(fields)
        .with_required(false)
        .with_allow_empty(true)
        .with_limits(&limits)
        .seal("query")
}

/// Contract for request bodies. Required and non-empty by default.
pub fn body_contract<I, K>(fields: I, limits: ContractLimits) -> Result<ObjectSchema, SchemaError>
where
    I: IntoIterator<Item = (K, FieldSchema)>,
    K: Into<String>,
{
    ObjectSchema::from_fields(fields)
        .with_required(true)
        .with_allow_empty(false)
        .with_limits(&limits)
        .seal("body")
}

/// Contract for path parameters. Every declared segment must be present,
/// so the key count is pinned to the number of fields.
pub fn params_contract<I, K>(fields: I, limits: ContractLimits) -> Result<ObjectSchema, SchemaError>
where
    I: IntoIterator<Item = (K, FieldSchema)>,
    K: Into<String>,
{
    let object = ObjectSchema::from_fields(fields)
        .with_required(true)
        .with_allow_empty(false)
        .with_limits(&limits);
    let segments = object.fields.len();
    object.with_length(segments).seal("params")
}

/// The full contract of one endpoint
#[derive(Debug, Clone, Default)]
pub struct RequestSchema {
    params: Option<ObjectSchema>,
    query: Option<ObjectSchema>,
    body: Option<ObjectSchema>,
}

impl RequestSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(mut self, schema: ObjectSchema) -> Self {
        self.params = Some(schema);
        self
    }

    pub fn query(mut self, schema: ObjectSchema) -> Self {
        self.query = Some(schema);
        self
    }

    pub fn body(mut self, schema: ObjectSchema) -> Self {
        self.body = Some(schema);
        self
    }

    pub fn params_schema(&self) -> Option<&ObjectSchema> {
        self.params.as_ref()
    }

    pub fn query_schema(&self) -> Option<&ObjectSchema> {
        self.query.as_ref()
    }

    pub fn body_schema(&self) -> Option<&ObjectSchema> {
        self.body.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    #[test]
    fn test_container_defaults() {
        let query = query_contract([("name", fields::bounded_text().optional())], ContractLimits::default()).unwrap();
        assert!(!query.is_required());
        assert!(query.allow_empty());
        assert_eq!(query.unknown_keys(), UnknownKeys::Reject);

        let body = body_contract([("name", fields::bounded_text())], ContractLimits::default()).unwrap();
        assert!(body.is_required());
        assert!(!body.allow_empty());
    }

    #[test]
    fn test_params_length_matches_segments() {
        let params = params_contract(
            [("area", fields::identifier()), ("worker", fields::identifier())],
            ContractLimits::default(),
        )
        .unwrap();
        assert_eq!(params.length(), Some(2));
    }

    #[test]
    fn test_limits_override_defaults() {
        let query = query_contract(
            [("name", fields::bounded_text().optional())],
            ContractLimits {
                max_keys: Some(4),
                allow_empty: Some(false),
                unknown_keys: UnknownKeys::Strip,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(query.max_keys(), Some(4));
        assert!(!query.allow_empty());
        assert_eq!(query.unknown_keys(), UnknownKeys::Strip);
    }

    #[test]
    fn test_required_keys_exceeding_max_keys_is_rejected() {
        let err = body_contract(
            [("code", fields::code()), ("name", fields::bounded_text())],
            ContractLimits {
                max_keys: Some(1),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidContract(_)));
    }

    #[test]
    fn test_inverted_key_bounds_are_rejected() {
        let err = query_contract(
            [("name", fields::bounded_text().optional())],
            ContractLimits {
                min_keys: Some(3),
                max_keys: Some(1),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvertedBounds { .. }));
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let err = body_contract(
            [("name", fields::bounded_text()), ("name", fields::bounded_text())],
            ContractLimits::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_field_errors_carry_the_full_path() {
        let err = query_contract(
            [("price", fields::number().min(5.0).max(1.0).optional())],
            ContractLimits::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("query.price"));
    }
}
