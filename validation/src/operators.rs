//! Filter operators
//!
//! The closed set of comparison operators a filterable field may expose,
//! together with the value shape each operator expects.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::schema::{FieldKind, FieldSchema, ObjectSchema, UnknownKeys};
use crate::transforms::{ParseTarget, Transform};

/// Maximum number of values accepted by `in` / `notIn`
pub const MAX_SET_VALUES: usize = 100;

/// Comparison operator, named on the wire in camelCase (`notILike`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    Like,
    NotLike,
    ILike,
    NotILike,
    StartsWith,
    EndsWith,
    Substring,
    Regexp,
    NotRegexp,
    IRegexp,
    NotIRegexp,
    In,
    NotIn,
    Eq,
    Ne,
    Is,
    Not,
}

/// Pattern-matching operators offered by text filters
pub const TEXT_OPERATORS: &[Operator] = &[
    Operator::Like,
    Operator::NotLike,
    Operator::ILike,
    Operator::NotILike,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::Substring,
    Operator::Regexp,
    Operator::NotRegexp,
    Operator::IRegexp,
    Operator::NotIRegexp,
];

/// Ordering operators offered by date and number filters
pub const RANGE_OPERATORS: &[Operator] = &[
    Operator::Gt,
    Operator::Gte,
    Operator::Lt,
    Operator::Lte,
    Operator::Between,
];

/// Membership and equality operators, usable on any scalar
pub const SET_OPERATORS: &[Operator] = &[Operator::In, Operator::NotIn, Operator::Eq, Operator::Ne];

const ALL: &[Operator] = &[
    Operator::Gt,
    Operator::Gte,
    Operator::Lt,
    Operator::Lte,
    Operator::Between,
    Operator::Like,
    Operator::NotLike,
    Operator::ILike,
    Operator::NotILike,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::Substring,
    Operator::Regexp,
    Operator::NotRegexp,
    Operator::IRegexp,
    Operator::NotIRegexp,
    Operator::In,
    Operator::NotIn,
    Operator::Eq,
    Operator::Ne,
    Operator::Is,
    Operator::Not,
];

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Between => "between",
            Operator::Like => "like",
            Operator::NotLike => "notLike",
            Operator::ILike => "iLike",
            Operator::NotILike => "notILike",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::Substring => "substring",
            Operator::Regexp => "regexp",
            Operator::NotRegexp => "notRegexp",
            Operator::IRegexp => "iRegexp",
            Operator::NotIRegexp => "notIRegexp",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Is => "is",
            Operator::Not => "not",
        }
    }

    pub fn from_name(name: &str) -> Option<Operator> {
        ALL.iter().copied().find(|op| op.as_str() == name)
    }

    pub fn all() -> &'static [Operator] {
        ALL
    }

    fn applies_to(&self, kind: &FieldKind) -> bool {
        match self {
            op if TEXT_OPERATORS.contains(op) => matches!(kind, FieldKind::String(_)),
            op if RANGE_OPERATORS.contains(op) => {
                matches!(kind, FieldKind::Number(_) | FieldKind::Date(_))
            }
            Operator::Is | Operator::Not => true,
            _ => kind.is_scalar(),
        }
    }

    /// Schema for the value this operator takes when applied to `base`.
    ///
    /// Comparison and pattern operators reuse the base rules; `between` takes
    /// an ascending pair, `in`/`notIn` a non-empty list, `is`/`not` a boolean
    /// or null.
    pub fn value_shape(&self, field: &str, base: &FieldSchema) -> Result<FieldSchema, SchemaError> {
        if !self.applies_to(base.kind()) {
            return Err(SchemaError::InapplicableOperator {
                field: field.to_string(),
                operator: self.as_str().to_string(),
                kind: base.kind().name().to_string(),
            });
        }

        let operand = base.operand();
        let shape = match self {
            Operator::Between => FieldSchema::array(operand).exact_length(2).ordered(),
            Operator::In | Operator::NotIn => FieldSchema::array(operand)
                .min_length(1)
                .max_length(MAX_SET_VALUES)
                .unique(),
            Operator::Is | Operator::Not => FieldSchema::boolean()
                .nullable()
                .transform(Transform::Trim)
                .transform(Transform::Parse(ParseTarget::NullableBoolean)),
            _ => operand,
        };
        Ok(shape.optional())
    }

    /// Build the operator-object alternative for `base`
    pub(crate) fn alternative(
        field: &str,
        base: &FieldSchema,
        operators: &[Operator],
    ) -> Result<FieldSchema, SchemaError> {
        let mut shapes = Vec::with_capacity(operators.len());
        for op in operators {
            shapes.push((op.as_str().to_string(), op.value_shape(field, base)?));
        }

        let object = ObjectSchema::from_fields(shapes)
            .with_min_keys(1)
            .with_allow_empty(false)
            .with_unknown_keys(UnknownKeys::Reject)
            .seal(field)?;
        Ok(FieldSchema::object(object))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How sibling conditions combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Combinator::And => "and",
            Combinator::Or => "or",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_serde() {
        for op in Operator::all() {
            let encoded = serde_json::to_value(op).unwrap();
            assert_eq!(encoded, serde_json::Value::String(op.as_str().to_string()));
            assert_eq!(Operator::from_name(op.as_str()), Some(*op));
        }
    }

    #[test]
    fn test_case_sensitive_names() {
        assert_eq!(Operator::from_name("notILike"), Some(Operator::NotILike));
        assert_eq!(Operator::from_name("notilike"), None);
        assert_eq!(Operator::from_name("bogus"), None);
    }

    #[test]
    fn test_text_operators_reject_numbers() {
        let err = Operator::Like
            .value_shape("age", &FieldSchema::number())
            .unwrap_err();
        assert!(matches!(err, SchemaError::InapplicableOperator { .. }));
    }

    #[test]
    fn test_range_operators_reject_text() {
        assert!(Operator::Gt.value_shape("name", &FieldSchema::string()).is_err());
        assert!(Operator::Gt.value_shape("age", &FieldSchema::number()).is_ok());
        assert!(Operator::In.value_shape("name", &FieldSchema::string()).is_ok());
    }
}
