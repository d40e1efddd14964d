//! Request validator
//!
//! Interprets a [`RequestSchema`] against raw `{params, query, body}` input.
//! Every container is checked, unknown keys are rejected or stripped,
//! aggregate key bounds are enforced before any field is looked at, and
//! each declared field is transformed, checked, and normalized. All failures
//! are collected into a single [`ValidationError`] unless fail-fast was
//! requested explicitly.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::checks::{
    compare_scalars, format_date, parse_date, parse_uuid, validate_date_range,
    validate_exact_length, validate_length, validate_member, validate_no_markup,
    validate_number_range,
};
use crate::error::{FailureKind, FieldFailure, Location, ValidationError};
use crate::filters::{FilterCondition, FilterGroup, ScalarKind};
use crate::operators::{Combinator, Operator};
use crate::schema::{
    ArrayRules, DateRules, FieldKind, FieldSchema, NumberRules, ObjectSchema, Pattern, Presence,
    RequestSchema, StringRules, UnknownKeys,
};
use crate::transforms::{apply_all, number_value};

/// Raw, untrusted input as decoded from an HTTP request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationRequest {
    pub params: Option<Value>,
    pub query: Option<Value>,
    pub body: Option<Value>,
}

impl ValidationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Normalized request: coerced, defaulted and whitelisted
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    pub params: Map<String, Value>,
    pub query: Map<String, Value>,
    pub body: Map<String, Value>,
    /// Filter conditions recorded from the query container
    #[serde(skip)]
    pub filters: FilterGroup,
    /// Optional containers the request left out
    #[serde(skip)]
    pub omitted: Vec<Location>,
}

impl ValidationResult {
    /// Feed the normalized containers back in as a request. Containers
    /// the original request omitted stay omitted.
    pub fn to_request(&self) -> ValidationRequest {
        let supplied = |location: Location, map: &Map<String, Value>| {
            (!self.omitted.contains(&location)).then(|| Value::Object(map.clone()))
        };
        ValidationRequest {
            params: supplied(Location::Params, &self.params),
            query: supplied(Location::Query, &self.query),
            body: supplied(Location::Body, &self.body),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    /// Stop at the first failing field instead of collecting every failure
    pub abort_early: bool,
    /// Clock used for `now`-relative date bounds; the system clock if unset
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: ValidateOptions,
}

/// Validate with default options against the system clock
pub fn validate(
    schema: &RequestSchema,
    request: &ValidationRequest,
) -> Result<ValidationResult, ValidationError> {
    Validator::default().validate(schema, request)
}

impl Validator {
    pub fn new(options: ValidateOptions) -> Self {
        Self { options }
    }

    /// Validator with a pinned clock
    pub fn at(now: DateTime<Utc>) -> Self {
        Self::new(ValidateOptions {
            now: Some(now),
            ..Default::default()
        })
    }

    pub fn with_abort_early(mut self, abort_early: bool) -> Self {
        self.options.abort_early = abort_early;
        self
    }

    pub fn options(&self) -> ValidateOptions {
        self.options
    }

    pub fn validate(
        &self,
        schema: &RequestSchema,
        request: &ValidationRequest,
    ) -> Result<ValidationResult, ValidationError> {
        let now = self.options.now.unwrap_or_else(Utc::now);
        let mut result = ValidationResult::default();
        let mut failures = Vec::new();

        let containers = [
            (Location::Params, schema.params_schema(), request.params.as_ref()),
            (Location::Query, schema.query_schema(), request.query.as_ref()),
            (Location::Body, schema.body_schema(), request.body.as_ref()),
        ];

        for (location, object, raw) in containers {
            if self.options.abort_early && !failures.is_empty() {
                break;
            }
            let Some(object) = object else {
                continue;
            };

            let pass = Pass {
                location,
                now,
                abort_early: self.options.abort_early,
            };
            let mut filters = FilterGroup::new(Combinator::And);
            let recorder = (location == Location::Query).then_some(&mut filters);

            match pass.container(object, raw, recorder) {
                Ok(map) => {
                    if matches!(raw, None | Some(Value::Null)) {
                        result.omitted.push(location);
                    }
                    match location {
                        Location::Params => result.params = map,
                        Location::Query => {
                            result.query = map;
                            result.filters = filters;
                        }
                        Location::Body => result.body = map,
                    }
                }
                Err(errs) => failures.extend(errs),
            }
        }

        if failures.is_empty() {
            Ok(result)
        } else {
            tracing::debug!(
                failures = failures.len(),
                first = %failures[0].qualified_path(),
                "request rejected by validation"
            );
            Err(ValidationError::new(failures))
        }
    }
}

/// Check a default value against its own field, at sealing time
pub(crate) fn check_default(field: &FieldSchema, name: &str, default: &Value) -> Result<(), String> {
    let pass = Pass {
        location: Location::Body,
        now: Utc::now(),
        abort_early: false,
    };
    pass.present(field, name, default)
        .map(|_| ())
        .map_err(|failures| {
            failures
                .iter()
                .map(|f| f.message.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        })
}

/// Which branch of a field accepted the value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Primary,
    Alternative,
}

type Checked<T> = Result<T, Vec<FieldFailure>>;

/// One walk over a single container
struct Pass {
    location: Location,
    now: DateTime<Utc>,
    abort_early: bool,
}

impl Pass {
    fn fail(&self, path: &str, kind: FailureKind, message: impl Into<String>) -> FieldFailure {
        FieldFailure::new(self.location, path, kind, message)
    }

    fn reject<T>(&self, path: &str, kind: FailureKind, message: impl Into<String>) -> Checked<T> {
        Err(vec![self.fail(path, kind, message)])
    }

    fn container(
        &self,
        schema: &ObjectSchema,
        raw: Option<&Value>,
        filters: Option<&mut FilterGroup>,
    ) -> Checked<Map<String, Value>> {
        match raw {
            None | Some(Value::Null) => {
                if schema.is_required() {
                    self.reject("", FailureKind::Required, "is required")
                } else {
                    self.defaults(schema)
                }
            }
            Some(Value::Object(map)) => self.object(schema, map, "", filters),
            Some(_) => self.reject("", FailureKind::Type, "must be an object"),
        }
    }

    /// Defaults of an omitted optional container. Key bounds and required
    /// fields apply only to containers that were supplied.
    fn defaults(&self, schema: &ObjectSchema) -> Checked<Map<String, Value>> {
        let mut out = Map::new();
        let mut failures = Vec::new();
        for (key, field) in schema.fields() {
            let Some(default) = field.default_value_ref() else {
                continue;
            };
            match self.present(field, key, default) {
                Ok((value, _)) => {
                    out.insert(key.to_string(), value);
                }
                Err(errs) => failures.extend(errs),
            }
        }

        if failures.is_empty() {
            Ok(out)
        } else {
            Err(failures)
        }
    }

    /// Key-count constraints; checked before any field so that oversized or
    /// malformed payloads are rejected without further work
    fn structure(&self, schema: &ObjectSchema, map: &Map<String, Value>, path: &str) -> Checked<()> {
        let counted = match schema.unknown_keys() {
            UnknownKeys::Reject => map.len(),
            UnknownKeys::Strip => map.keys().filter(|k| schema.declares(k)).count(),
        };

        if counted == 0 && !schema.allow_empty() {
            return self.reject(path, FailureKind::Empty, "must not be empty");
        }
        if let Some(length) = schema.length() {
            if counted != length {
                let kind = if counted < length {
                    FailureKind::TooFewKeys
                } else {
                    FailureKind::TooManyKeys
                };
                return self.reject(path, kind, format!("must contain exactly {} keys", length));
            }
        }
        if let Some(max) = schema.max_keys() {
            if counted > max {
                return self.reject(
                    path,
                    FailureKind::TooManyKeys,
                    format!("must contain at most {} keys", max),
                );
            }
        }
        if let Some(min) = schema.min_keys() {
            if counted < min {
                return self.reject(
                    path,
                    FailureKind::TooFewKeys,
                    format!("must contain at least {} keys", min),
                );
            }
        }
        Ok(())
    }

    fn object(
        &self,
        schema: &ObjectSchema,
        map: &Map<String, Value>,
        prefix: &str,
        mut filters: Option<&mut FilterGroup>,
    ) -> Checked<Map<String, Value>> {
        self.structure(schema, map, prefix)?;

        let mut failures = Vec::new();
        if schema.unknown_keys() == UnknownKeys::Reject {
            for key in map.keys().filter(|k| !schema.declares(k)) {
                failures.push(self.fail(&join(prefix, key), FailureKind::UnknownKey, "is not allowed"));
            }
            if self.abort_early && !failures.is_empty() {
                return Err(failures);
            }
        }

        let mut out = Map::new();
        for (key, field) in schema.fields() {
            let path = join(prefix, key);
            let raw = map.get(key);

            if let FieldKind::Group(combinator, group) = field.kind() {
                match raw {
                    None => {}
                    Some(Value::Object(inner)) => {
                        let mut sub = FilterGroup::new(*combinator);
                        let target = if filters.is_some() { Some(&mut sub) } else { None };
                        match self.object(group, inner, &path, target) {
                            Ok(normalized) => {
                                out.insert(key.to_string(), Value::Object(normalized));
                                if let Some(parent) = filters.as_deref_mut() {
                                    if !sub.is_empty() {
                                        parent.groups.push(sub);
                                    }
                                }
                            }
                            Err(errs) => failures.extend(errs),
                        }
                    }
                    Some(_) => failures.push(self.fail(&path, FailureKind::Type, "must be an object")),
                }
            } else {
                match self.field(field, &path, raw) {
                    Ok(Some((value, branch))) => {
                        if field.is_filter() && raw.is_some() {
                            if let Some(group) = filters.as_deref_mut() {
                                group.record(
                                    key,
                                    ScalarKind::of(field.kind()),
                                    condition(branch, &value),
                                );
                            }
                        }
                        out.insert(key.to_string(), value);
                    }
                    Ok(None) => {}
                    Err(errs) => failures.extend(errs),
                }
            }

            if self.abort_early && !failures.is_empty() {
                break;
            }
        }

        if failures.is_empty() {
            Ok(out)
        } else {
            Err(failures)
        }
    }

    fn field(
        &self,
        field: &FieldSchema,
        path: &str,
        raw: Option<&Value>,
    ) -> Checked<Option<(Value, Branch)>> {
        match raw {
            Some(value) => self.present(field, path, value).map(Some),
            None => match (field.presence(), field.default_value_ref()) {
                (Presence::Required, _) => self.reject(path, FailureKind::Required, "is required"),
                (_, Some(default)) => self.present(field, path, default).map(Some),
                (_, None) => Ok(None),
            },
        }
    }

    fn present(&self, field: &FieldSchema, path: &str, value: &Value) -> Checked<(Value, Branch)> {
        if field.presence() == Presence::Forbidden {
            return self.reject(path, FailureKind::Forbidden, "is not allowed to be set");
        }

        let transformed = apply_all(field.transforms(), value.clone());
        if transformed.is_null() {
            return if field.is_nullable() {
                Ok((Value::Null, Branch::Primary))
            } else {
                self.reject(path, FailureKind::Type, "must not be null")
            };
        }

        match self.shape(field.kind(), path, transformed) {
            Ok(normalized) => Ok((normalized, Branch::Primary)),
            Err(mut primary) => match field.alternative() {
                Some(alternative) if value.is_object() => {
                    match self.shape(alternative.kind(), path, value.clone()) {
                        Ok(normalized) => Ok((normalized, Branch::Alternative)),
                        Err(secondary) => {
                            primary.extend(secondary);
                            Err(primary)
                        }
                    }
                }
                _ => Err(primary),
            },
        }
    }

    fn shape(&self, kind: &FieldKind, path: &str, value: Value) -> Checked<Value> {
        match kind {
            FieldKind::String(rules) => self.string(rules, path, value),
            FieldKind::Number(rules) => self.number(rules, path, value),
            FieldKind::Boolean => match value {
                Value::Bool(b) => Ok(Value::Bool(b)),
                _ => self.reject(path, FailureKind::Type, "must be a boolean"),
            },
            FieldKind::Date(rules) => self.date(rules, path, value),
            FieldKind::Uuid(rules) => match value {
                Value::String(s) => parse_uuid(&s, rules.version)
                    .map(Value::String)
                    .map_err(|message| vec![self.fail(path, FailureKind::Type, message)]),
                _ => self.reject(path, FailureKind::Type, "must be a string"),
            },
            FieldKind::Array(rules) => self.array(rules, path, value),
            FieldKind::Object(schema) | FieldKind::Group(_, schema) => match value {
                Value::Object(map) => self.object(schema, &map, path, None).map(Value::Object),
                _ => self.reject(path, FailureKind::Type, "must be an object"),
            },
        }
    }

    fn string(&self, rules: &StringRules, path: &str, value: Value) -> Checked<Value> {
        let Value::String(s) = value else {
            return self.reject(path, FailureKind::Type, "must be a string");
        };

        let mut failures = Vec::new();
        if let Some(length) = rules.length {
            if let Err(message) = validate_exact_length(&s, length) {
                failures.push(self.fail(path, FailureKind::Range, message));
            }
        }
        if let Err(message) = validate_length(&s, rules.min_length, rules.max_length) {
            failures.push(self.fail(path, FailureKind::Range, message));
        }
        if let Some(allowed) = &rules.allowed {
            if let Err(message) = validate_member(&s, allowed) {
                failures.push(self.fail(path, FailureKind::Enum, message));
            }
        }
        if let Some(Pattern::Compiled(regex)) = &rules.pattern {
            if !regex.is_match(&s) {
                failures.push(self.fail(
                    path,
                    FailureKind::Pattern,
                    format!("must match the pattern {}", regex.as_str()),
                ));
            }
        }
        if rules.reject_markup {
            if let Err(message) = validate_no_markup(&s) {
                failures.push(self.fail(path, FailureKind::Pattern, message));
            }
        }

        if failures.is_empty() {
            Ok(Value::String(s))
        } else {
            Err(failures)
        }
    }

    fn number(&self, rules: &NumberRules, path: &str, value: Value) -> Checked<Value> {
        let number = match &value {
            Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
            _ => None,
        };
        let Some(n) = number else {
            return self.reject(path, FailureKind::Type, "must be a number");
        };

        let mut failures = Vec::new();
        if rules.integer && n.fract() != 0.0 {
            failures.push(self.fail(path, FailureKind::Type, "must be an integer"));
        }
        if rules.positive {
            if rules.allow_zero && n < 0.0 {
                failures.push(self.fail(path, FailureKind::Range, "must not be negative"));
            } else if !rules.allow_zero && n <= 0.0 {
                failures.push(self.fail(path, FailureKind::Range, "must be positive"));
            }
        }
        if let Err(message) = validate_number_range(n, rules.min, rules.max) {
            failures.push(self.fail(path, FailureKind::Range, message));
        }

        if !failures.is_empty() {
            return Err(failures);
        }
        match value {
            Value::Number(exact) if exact.is_i64() || exact.is_u64() => Ok(Value::Number(exact)),
            _ => Ok(number_value(n)),
        }
    }

    fn date(&self, rules: &DateRules, path: &str, value: Value) -> Checked<Value> {
        let Some(at) = parse_date(&value) else {
            return self.reject(path, FailureKind::Type, "must be a valid ISO 8601 date");
        };
        let latest = rules.latest.map(|bound| bound.resolve(self.now));
        validate_date_range(at, rules.earliest, latest)
            .map_err(|message| vec![self.fail(path, FailureKind::Range, message)])?;
        Ok(Value::String(format_date(at)))
    }

    fn array(&self, rules: &ArrayRules, path: &str, value: Value) -> Checked<Value> {
        let Value::Array(items) = value else {
            return self.reject(path, FailureKind::Type, "must be an array");
        };

        let mut out = Vec::with_capacity(items.len());
        let mut failures = Vec::new();
        for (i, item) in items.iter().enumerate() {
            match self.present(&rules.items, &format!("{}[{}]", path, i), item) {
                Ok((normalized, _)) => out.push(normalized),
                Err(errs) => failures.extend(errs),
            }
            if self.abort_early && !failures.is_empty() {
                break;
            }
        }
        if !failures.is_empty() {
            return Err(failures);
        }

        // item failures come first so that allow-list violations are named
        let count = out.len();
        if let Some(length) = rules.length {
            if count != length {
                return self.reject(
                    path,
                    FailureKind::Range,
                    format!("must contain exactly {} items", length),
                );
            }
        }
        if let Some(max) = rules.max_items {
            if count > max {
                return self.reject(
                    path,
                    FailureKind::Range,
                    format!("must contain at most {} items", max),
                );
            }
        }
        if let Some(min) = rules.min_items {
            if count < min {
                return self.reject(
                    path,
                    FailureKind::Range,
                    format!("must contain at least {} items", min),
                );
            }
        }

        if rules.unique {
            for i in 1..out.len() {
                if out[..i].contains(&out[i]) {
                    return self.reject(
                        &format!("{}[{}]", path, i),
                        FailureKind::Range,
                        "duplicates an earlier item",
                    );
                }
            }
        }
        if rules.ordered {
            for pair in out.windows(2) {
                if compare_scalars(&pair[0], &pair[1]) == Some(Ordering::Greater) {
                    return self.reject(path, FailureKind::Range, "must be in ascending order");
                }
            }
        }

        Ok(Value::Array(out))
    }
}

fn condition(branch: Branch, value: &Value) -> FilterCondition {
    match (branch, value) {
        (Branch::Alternative, Value::Object(map)) => FilterCondition::Operators(
            map.iter()
                .filter_map(|(name, v)| Operator::from_name(name).map(|op| (op, v.clone())))
                .collect(),
        ),
        _ => FilterCondition::Literal(value.clone()),
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}
