//! Reusable field builders
//!
//! Entity-agnostic starting points for contract fields. Entity contracts
//! chain deltas onto these (`.optional()`, `.nullable()`, `.min(..)`) rather
//! than restating the rules.

use chrono::{DateTime, Utc};

use crate::config::PaginationConfig;
use crate::operators::{Combinator, Operator, RANGE_OPERATORS, TEXT_OPERATORS};
use crate::schema::{DateBound, FieldSchema, ObjectSchema};
use crate::transforms::{ParseTarget, Transform};

/// Business code such as `AR-0001`
pub const CODE_PATTERN: &str = r"^[A-Z]{2,4}-[0-9]{4,8}$";
pub const CODE_MAX_LENGTH: usize = 13;

pub const TEXT_MAX_LENGTH: usize = 255;

/// Longest attribute or association name accepted in an allow-list
pub const LIST_ITEM_MAX_LENGTH: usize = 64;

pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;

/// Identifier operators: membership and inequality
pub const IDENTIFIER_OPERATORS: &[Operator] = &[Operator::In, Operator::NotIn, Operator::Ne];

/// UUID v4 primary or foreign key
pub fn identifier() -> FieldSchema {
    FieldSchema::uuid().version(4).transform(Transform::Trim)
}

pub fn filterable_identifier() -> FieldSchema {
    filterable(identifier(), IDENTIFIER_OPERATORS)
}

pub fn code() -> FieldSchema {
    FieldSchema::string()
        .transform(Transform::Trim)
        .max_length(CODE_MAX_LENGTH)
        .pattern(CODE_PATTERN)
}

/// Trimmed, non-empty, markup-free text
pub fn bounded_text() -> FieldSchema {
    FieldSchema::string()
        .transform(Transform::Trim)
        .min_length(1)
        .max_length(TEXT_MAX_LENGTH)
        .reject_markup()
}

pub fn filterable_text() -> FieldSchema {
    filterable(bounded_text(), TEXT_OPERATORS)
}

/// Date between the epoch and the validator's clock
pub fn iso_date() -> FieldSchema {
    FieldSchema::date()
        .transform(Transform::Trim)
        .earliest(DateTime::<Utc>::UNIX_EPOCH)
        .latest(DateBound::Now)
}

pub fn filterable_date() -> FieldSchema {
    filterable(iso_date(), RANGE_OPERATORS)
}

/// Finite number; numeric strings are coerced
pub fn number() -> FieldSchema {
    FieldSchema::number()
        .transform(Transform::Trim)
        .transform(Transform::Parse(ParseTarget::Number))
}

pub fn filterable_number() -> FieldSchema {
    filterable(number(), RANGE_OPERATORS)
}

pub fn boolean() -> FieldSchema {
    FieldSchema::boolean()
        .transform(Transform::Trim)
        .transform(Transform::Parse(ParseTarget::Boolean))
}

/// Closed set of strings, compared exactly
pub fn enumeration<I, S>(values: I) -> FieldSchema
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    FieldSchema::string().transform(Transform::Trim).one_of(values)
}

/// Attributes a client may ask to have returned
pub fn attribute_list(allowed: &[&str]) -> FieldSchema {
    allow_list(allowed)
}

/// Associations a client may ask to have included
pub fn association_list(allowed: &[&str]) -> FieldSchema {
    allow_list(allowed)
}

/// Comma-separated string or array whose items must come from `allowed`
fn allow_list(allowed: &[&str]) -> FieldSchema {
    let item = FieldSchema::string()
        .max_length(LIST_ITEM_MAX_LENGTH)
        .one_of(allowed.iter().copied());

    FieldSchema::array(item)
        .transform(Transform::split(","))
        .transform(Transform::Trim)
        .min_length(1)
        .max_length(allowed.len())
        .unique()
}

pub fn offset() -> FieldSchema {
    number().integer().positive().allow_zero().default_value(0)
}

pub fn limit() -> FieldSchema {
    limit_with(DEFAULT_LIMIT, MAX_LIMIT)
}

/// Page size between 1 and `cap`; values above the cap are rejected
pub fn limit_with(default: u64, cap: u64) -> FieldSchema {
    number()
        .integer()
        .min(1.0)
        .max(cap as f64)
        .default_value(default)
}

/// `offset` and `limit` fields sized from configuration
pub fn pagination(config: &PaginationConfig) -> [(&'static str, FieldSchema); 2] {
    [
        ("offset", offset()),
        ("limit", limit_with(config.default_limit, config.max_limit)),
    ]
}

pub fn sort_direction() -> FieldSchema {
    enumeration(["asc", "desc"]).default_value("asc")
}

/// Column to sort by, from a fixed set
pub fn sort_by(allowed: &[&str]) -> FieldSchema {
    enumeration(allowed.iter().copied()).optional()
}

/// Add an operator-object alternative to `base`
pub fn filterable(base: FieldSchema, operators: &[Operator]) -> FieldSchema {
    base.filterable(operators)
}

/// Filters under this key match when any of them matches
pub fn any_of<I, K>(fields: I) -> FieldSchema
where
    I: IntoIterator<Item = (K, FieldSchema)>,
    K: Into<String>,
{
    FieldSchema::group(Combinator::Or, ObjectSchema::from_fields(fields))
}

/// Filters under this key must all match
pub fn all_of<I, K>(fields: I) -> FieldSchema
where
    I: IntoIterator<Item = (K, FieldSchema)>,
    K: Into<String>,
{
    FieldSchema::group(Combinator::And, ObjectSchema::from_fields(fields))
}

/// Nested JSON object with its own declared keys
pub fn nested<I, K>(fields: I) -> FieldSchema
where
    I: IntoIterator<Item = (K, FieldSchema)>,
    K: Into<String>,
{
    FieldSchema::object(ObjectSchema::from_fields(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::schema::{FieldKind, Presence};
    use serde_json::json;

    #[test]
    fn test_pagination_defaults() {
        let limit = limit().seal("limit").unwrap();
        assert_eq!(limit.default_value_ref(), Some(&json!(20)));
        assert_eq!(limit.presence(), Presence::Optional);

        let offset = offset().seal("offset").unwrap();
        assert_eq!(offset.default_value_ref(), Some(&json!(0)));
    }

    #[test]
    fn test_limit_with_rejects_zero_cap_and_oversized_default() {
        assert!(matches!(
            limit_with(0, 0).seal("limit").unwrap_err(),
            SchemaError::InvertedBounds { .. }
        ));
        assert!(matches!(
            limit_with(50, 10).seal("limit").unwrap_err(),
            SchemaError::InvalidDefault { .. }
        ));
        assert!(limit_with(10, 50).seal("limit").is_ok());
    }

    #[test]
    fn test_pagination_from_config() {
        let config = PaginationConfig {
            default_limit: 10,
            max_limit: 50,
        };
        let [(offset_key, _), (limit_key, limit)] = pagination(&config);
        assert_eq!(offset_key, "offset");
        assert_eq!(limit_key, "limit");
        assert_eq!(limit.default_value_ref(), Some(&json!(10)));
    }

    #[test]
    fn test_sort_direction_default() {
        let sealed = sort_direction().seal("direction").unwrap();
        assert_eq!(sealed.default_value_ref(), Some(&json!("asc")));
    }

    #[test]
    fn test_allow_list_shape() {
        let list = attribute_list(&["id", "name"]).seal("attributes").unwrap();
        match list.kind() {
            FieldKind::Array(rules) => {
                assert_eq!(rules.max_items, Some(2));
                assert!(rules.unique);
            }
            other => panic!("unexpected kind {}", other.name()),
        }
    }

    #[test]
    fn test_empty_allow_list_fails_to_seal() {
        assert!(association_list(&[]).seal("include").is_err());
    }

    #[test]
    fn test_filterable_text_exposes_text_operators_only() {
        let sealed = filterable_text().seal("name").unwrap();
        assert!(sealed.is_filter());
        assert_eq!(sealed.operators(), TEXT_OPERATORS);
    }

    #[test]
    fn test_filterable_identifier_accepts_membership() {
        let sealed = filterable_identifier().seal("area").unwrap();
        assert!(sealed.operators().contains(&Operator::In));
    }
}
