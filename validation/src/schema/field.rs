//! Field schemas
//!
//! A [`FieldSchema`] describes one value: its kind, presence rules,
//! coercions and shape constraints. Modifiers consume the schema and return
//! a new one; nothing is shared or mutated once built.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;

use super::object::ObjectSchema;
use crate::error::SchemaError;
use crate::operators::{Combinator, Operator};
use crate::transforms::Transform;

/// Whether a field must, may, or must not be supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    Forbidden,
}

/// A compiled match expression, or the reason it failed to compile
#[derive(Debug, Clone)]
pub enum Pattern {
    Compiled(Regex),
    Invalid { source: String, reason: String },
}

impl Pattern {
    fn new(source: &str) -> Self {
        match Regex::new(source) {
            Ok(regex) => Pattern::Compiled(regex),
            Err(err) => Pattern::Invalid {
                source: source.to_string(),
                reason: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StringRules {
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
    pub(crate) length: Option<usize>,
    pub(crate) pattern: Option<Pattern>,
    pub(crate) allowed: Option<Vec<String>>,
    pub(crate) reject_markup: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NumberRules {
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
    pub(crate) integer: bool,
    pub(crate) positive: bool,
    pub(crate) allow_zero: bool,
}

/// Upper date bound; `Now` is evaluated against the validator's clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Fixed(DateTime<Utc>),
    Now,
}

impl DateBound {
    pub fn resolve(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            DateBound::Fixed(at) => *at,
            DateBound::Now => now,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DateRules {
    pub(crate) earliest: Option<DateTime<Utc>>,
    pub(crate) latest: Option<DateBound>,
}

#[derive(Debug, Clone, Default)]
pub struct UuidRules {
    pub(crate) version: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ArrayRules {
    pub(crate) items: Box<FieldSchema>,
    pub(crate) min_items: Option<usize>,
    pub(crate) max_items: Option<usize>,
    pub(crate) length: Option<usize>,
    pub(crate) unique: bool,
    pub(crate) ordered: bool,
}

/// The closed set of value kinds
#[derive(Debug, Clone)]
pub enum FieldKind {
    String(StringRules),
    Number(NumberRules),
    Boolean,
    Date(DateRules),
    Uuid(UuidRules),
    Array(ArrayRules),
    Object(ObjectSchema),
    /// Nested filter fields combined with `and` / `or`
    Group(Combinator, ObjectSchema),
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::String(_) => "string",
            FieldKind::Number(_) => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Date(_) => "date",
            FieldKind::Uuid(_) => "uuid",
            FieldKind::Array(_) => "array",
            FieldKind::Object(_) => "object",
            FieldKind::Group(..) => "group",
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            FieldKind::String(_)
                | FieldKind::Number(_)
                | FieldKind::Boolean
                | FieldKind::Date(_)
                | FieldKind::Uuid(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct FieldSchema {
    kind: FieldKind,
    presence: Presence,
    nullable: bool,
    default: Option<Value>,
    transforms: Vec<Transform>,
    operators: Vec<Operator>,
    alternative: Option<Box<FieldSchema>>,
    filter: bool,
    misapplied: Option<String>,
}

impl FieldSchema {
    fn with_kind(kind: FieldKind) -> Self {
        Self {
            kind,
            presence: Presence::Required,
            nullable: false,
            default: None,
            transforms: Vec::new(),
            operators: Vec::new(),
            alternative: None,
            filter: false,
            misapplied: None,
        }
    }

    pub fn string() -> Self {
        Self::with_kind(FieldKind::String(StringRules::default()))
    }

    pub fn number() -> Self {
        Self::with_kind(FieldKind::Number(NumberRules::default()))
    }

    pub fn boolean() -> Self {
        Self::with_kind(FieldKind::Boolean)
    }

    pub fn date() -> Self {
        Self::with_kind(FieldKind::Date(DateRules::default()))
    }

    pub fn uuid() -> Self {
        Self::with_kind(FieldKind::Uuid(UuidRules::default()))
    }

    pub fn array(items: FieldSchema) -> Self {
        Self::with_kind(FieldKind::Array(ArrayRules {
            items: Box::new(items),
            min_items: None,
            max_items: None,
            length: None,
            unique: false,
            ordered: false,
        }))
    }

    pub fn object(schema: ObjectSchema) -> Self {
        Self::with_kind(FieldKind::Object(schema))
    }

    pub fn group(combinator: Combinator, schema: ObjectSchema) -> Self {
        Self::with_kind(FieldKind::Group(combinator, schema)).optional()
    }

    // ── accessors ──────────────────────────────────────────────────────────

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn default_value_ref(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn alternative(&self) -> Option<&FieldSchema> {
        self.alternative.as_deref()
    }

    pub fn is_filter(&self) -> bool {
        self.filter
    }

    // ── presence ───────────────────────────────────────────────────────────

    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }

    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    pub fn forbidden(mut self) -> Self {
        self.presence = Presence::Forbidden;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Value used when the field is absent. Implies optional.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        if self.presence == Presence::Required {
            self.presence = Presence::Optional;
        }
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Record this field's value as an equality filter
    pub fn as_filter(mut self) -> Self {
        self.filter = true;
        self
    }

    /// Accept an operator object built from `operators` in place of a literal
    pub fn filterable(mut self, operators: &[Operator]) -> Self {
        for op in operators {
            if !self.operators.contains(op) {
                self.operators.push(*op);
            }
        }
        self.filter = true;
        self
    }

    // ── shape constraints ──────────────────────────────────────────────────

    /// Minimum characters for strings, minimum items for arrays
    pub fn min_length(mut self, n: usize) -> Self {
        match &mut self.kind {
            FieldKind::String(rules) => rules.min_length = Some(n),
            FieldKind::Array(rules) => rules.min_items = Some(n),
            _ => self.misapply("min_length"),
        }
        self
    }

    /// Maximum characters for strings, maximum items for arrays
    pub fn max_length(mut self, n: usize) -> Self {
        match &mut self.kind {
            FieldKind::String(rules) => rules.max_length = Some(n),
            FieldKind::Array(rules) => rules.max_items = Some(n),
            _ => self.misapply("max_length"),
        }
        self
    }

    /// Exact characters for strings, exact items for arrays
    pub fn exact_length(mut self, n: usize) -> Self {
        match &mut self.kind {
            FieldKind::String(rules) => rules.length = Some(n),
            FieldKind::Array(rules) => rules.length = Some(n),
            _ => self.misapply("exact_length"),
        }
        self
    }

    pub fn pattern(mut self, source: &str) -> Self {
        match &mut self.kind {
            FieldKind::String(rules) => rules.pattern = Some(Pattern::new(source)),
            _ => self.misapply("pattern"),
        }
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match &mut self.kind {
            FieldKind::String(rules) => {
                rules.allowed = Some(values.into_iter().map(Into::into).collect())
            }
            _ => self.misapply("one_of"),
        }
        self
    }

    pub fn reject_markup(mut self) -> Self {
        match &mut self.kind {
            FieldKind::String(rules) => rules.reject_markup = true,
            _ => self.misapply("reject_markup"),
        }
        self
    }

    pub fn min(mut self, value: f64) -> Self {
        match &mut self.kind {
            FieldKind::Number(rules) => rules.min = Some(value),
            _ => self.misapply("min"),
        }
        self
    }

    pub fn max(mut self, value: f64) -> Self {
        match &mut self.kind {
            FieldKind::Number(rules) => rules.max = Some(value),
            _ => self.misapply("max"),
        }
        self
    }

    pub fn integer(mut self) -> Self {
        match &mut self.kind {
            FieldKind::Number(rules) => rules.integer = true,
            _ => self.misapply("integer"),
        }
        self
    }

    pub fn positive(mut self) -> Self {
        match &mut self.kind {
            FieldKind::Number(rules) => rules.positive = true,
            _ => self.misapply("positive"),
        }
        self
    }

    /// With `positive`, also accept zero
    pub fn allow_zero(mut self) -> Self {
        match &mut self.kind {
            FieldKind::Number(rules) => rules.allow_zero = true,
            _ => self.misapply("allow_zero"),
        }
        self
    }

    pub fn earliest(mut self, at: DateTime<Utc>) -> Self {
        match &mut self.kind {
            FieldKind::Date(rules) => rules.earliest = Some(at),
            _ => self.misapply("earliest"),
        }
        self
    }

    pub fn latest(mut self, bound: DateBound) -> Self {
        match &mut self.kind {
            FieldKind::Date(rules) => rules.latest = Some(bound),
            _ => self.misapply("latest"),
        }
        self
    }

    pub fn version(mut self, version: usize) -> Self {
        match &mut self.kind {
            FieldKind::Uuid(rules) => rules.version = Some(version),
            _ => self.misapply("version"),
        }
        self
    }

    pub fn unique(mut self) -> Self {
        match &mut self.kind {
            FieldKind::Array(rules) => rules.unique = true,
            _ => self.misapply("unique"),
        }
        self
    }

    /// Items must be in ascending order
    pub fn ordered(mut self) -> Self {
        match &mut self.kind {
            FieldKind::Array(rules) => rules.ordered = true,
            _ => self.misapply("ordered"),
        }
        self
    }

    fn misapply(&mut self, modifier: &str) {
        if self.misapplied.is_none() {
            self.misapplied = Some(format!(
                "'{}' does not apply to {} fields",
                modifier,
                self.kind.name()
            ));
        }
    }

    /// The bare value rules, as used for operator operands
    pub(crate) fn operand(&self) -> FieldSchema {
        FieldSchema {
            kind: self.kind.clone(),
            presence: Presence::Required,
            nullable: false,
            default: None,
            transforms: self.transforms.clone(),
            operators: Vec::new(),
            alternative: None,
            filter: false,
            misapplied: None,
        }
    }

    // ── construction-time checks ───────────────────────────────────────────

    /// Check the field for internal consistency and build its operator
    /// alternative. Every schema reachable from a contract is sealed.
    pub fn seal(mut self, name: &str) -> Result<FieldSchema, SchemaError> {
        if let Some(reason) = self.misapplied.take() {
            return Err(SchemaError::field(name, reason));
        }

        if self.default.is_some() && self.presence != Presence::Optional {
            return Err(SchemaError::field(
                name,
                "a default value requires an optional field",
            ));
        }

        self.kind = seal_kind(self.kind, name)?;

        if !self.operators.is_empty() {
            let alternative = Operator::alternative(name, &self, &self.operators)?;
            self.alternative = Some(Box::new(alternative));
        }

        if let Some(default) = &self.default {
            crate::validator::check_default(&self, name, default).map_err(|reason| {
                SchemaError::InvalidDefault {
                    field: name.to_string(),
                    reason,
                }
            })?;
        }

        Ok(self)
    }
}

fn seal_kind(kind: FieldKind, name: &str) -> Result<FieldKind, SchemaError> {
    match kind {
        FieldKind::String(rules) => {
            check_lengths(name, rules.min_length, rules.max_length, rules.length)?;
            if let Some(Pattern::Invalid { source, reason }) = &rules.pattern {
                return Err(SchemaError::InvalidPattern {
                    field: name.to_string(),
                    reason: format!("{} ({})", source, reason),
                });
            }
            if let Some(allowed) = &rules.allowed {
                if allowed.is_empty() {
                    return Err(SchemaError::field(name, "allowed values must not be empty"));
                }
                for (i, value) in allowed.iter().enumerate() {
                    if allowed[..i].contains(value) {
                        return Err(SchemaError::field(
                            name,
                            format!("allowed value '{}' is listed twice", value),
                        ));
                    }
                }
            }
            Ok(FieldKind::String(rules))
        }
        FieldKind::Number(rules) => {
            for bound in [rules.min, rules.max].into_iter().flatten() {
                if !bound.is_finite() {
                    return Err(SchemaError::field(name, "numeric bounds must be finite"));
                }
            }
            if let (Some(min), Some(max)) = (rules.min, rules.max) {
                if min > max {
                    return Err(SchemaError::inverted(name, min, max));
                }
            }
            if rules.positive {
                if let Some(max) = rules.max {
                    if max < 0.0 || (max == 0.0 && !rules.allow_zero) {
                        return Err(SchemaError::field(
                            name,
                            format!("no positive value is at most {}", max),
                        ));
                    }
                }
            }
            Ok(FieldKind::Number(rules))
        }
        FieldKind::Date(rules) => {
            if let (Some(earliest), Some(DateBound::Fixed(latest))) = (rules.earliest, rules.latest) {
                if earliest > latest {
                    return Err(SchemaError::inverted(name, earliest, latest));
                }
            }
            Ok(FieldKind::Date(rules))
        }
        FieldKind::Array(ArrayRules {
            items,
            min_items,
            max_items,
            length,
            unique,
            ordered,
        }) => {
            check_lengths(name, min_items, max_items, length)?;
            let items = (*items).seal(&format!("{}[]", name))?;
            if ordered
                && !matches!(
                    items.kind(),
                    FieldKind::Number(_) | FieldKind::Date(_) | FieldKind::String(_)
                )
            {
                return Err(SchemaError::field(
                    name,
                    "only numbers, dates and strings can be ordered",
                ));
            }
            Ok(FieldKind::Array(ArrayRules {
                items: Box::new(items),
                min_items,
                max_items,
                length,
                unique,
                ordered,
            }))
        }
        FieldKind::Object(schema) => Ok(FieldKind::Object(schema.seal(name)?)),
        FieldKind::Group(combinator, schema) => Ok(FieldKind::Group(combinator, schema.seal(name)?)),
        other => Ok(other),
    }
}

fn check_lengths(
    name: &str,
    min: Option<usize>,
    max: Option<usize>,
    exact: Option<usize>,
) -> Result<(), SchemaError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(SchemaError::inverted(name, min, max));
        }
    }
    if let Some(exact) = exact {
        if min.map_or(false, |min| exact < min) || max.map_or(false, |max| exact > max) {
            return Err(SchemaError::field(
                name,
                format!("exact length {} conflicts with its bounds", exact),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_return_new_schema() {
        let base = FieldSchema::string().max_length(10);
        let optional = base.clone().optional().nullable();

        assert_eq!(base.presence(), Presence::Required);
        assert!(!base.is_nullable());
        assert_eq!(optional.presence(), Presence::Optional);
        assert!(optional.is_nullable());
    }

    #[test]
    fn test_inverted_string_bounds_fail_to_seal() {
        let err = FieldSchema::string().min_length(5).max_length(3).seal("name").unwrap_err();
        assert_eq!(err, SchemaError::inverted("name", 5, 3));
    }

    #[test]
    fn test_inverted_number_bounds_fail_to_seal() {
        let err = FieldSchema::number().min(10.0).max(1.0).seal("qty").unwrap_err();
        assert!(matches!(err, SchemaError::InvertedBounds { .. }));
    }

    #[test]
    fn test_misapplied_modifier_fails_to_seal() {
        let err = FieldSchema::boolean().max_length(3).seal("flag").unwrap_err();
        assert!(err.to_string().contains("max_length"));
    }

    #[test]
    fn test_invalid_pattern_fails_to_seal() {
        let err = FieldSchema::string().pattern("([a-z").seal("code").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { .. }));
    }

    #[test]
    fn test_empty_and_duplicate_enumerations_fail_to_seal() {
        let empty: [&str; 0] = [];
        assert!(FieldSchema::string().one_of(empty).seal("status").is_err());
        assert!(FieldSchema::string().one_of(["a", "a"]).seal("status").is_err());
        assert!(FieldSchema::string().one_of(["a", "b"]).seal("status").is_ok());
    }

    #[test]
    fn test_default_on_required_field_fails_to_seal() {
        let err = FieldSchema::number().default_value(3).required().seal("limit").unwrap_err();
        assert!(err.to_string().contains("optional"));
    }

    #[test]
    fn test_invalid_default_fails_to_seal() {
        let err = FieldSchema::number().max(10.0).default_value(20).seal("limit").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault { .. }));
    }

    #[test]
    fn test_seal_builds_alternative() {
        let sealed = FieldSchema::number()
            .filterable(&[Operator::Gt, Operator::Between])
            .seal("price")
            .unwrap();

        let alternative = sealed.alternative().expect("alternative");
        match alternative.kind() {
            FieldKind::Object(object) => {
                assert!(object.field("gt").is_some());
                assert!(object.field("between").is_some());
                assert!(object.field("like").is_none());
            }
            other => panic!("unexpected kind {}", other.name()),
        }
    }

    #[test]
    fn test_inapplicable_operator_fails_to_seal() {
        let err = FieldSchema::boolean()
            .filterable(&[Operator::Gt])
            .seal("active")
            .unwrap_err();
        assert!(matches!(err, SchemaError::InapplicableOperator { .. }));
    }
}
