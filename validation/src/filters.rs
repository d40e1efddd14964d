//! Filter compilation
//!
//! The validator records which filterable query fields were supplied and in
//! what form. [`compile_filters`] turns that record into a storage-agnostic
//! [`QueryCriteria`] tree: literals become equality, `between` becomes a
//! range, and siblings combine with AND unless grouped under `or`.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::operators::{Combinator, Operator};
use crate::schema::FieldKind;
use crate::validator::ValidationResult;

/// Value kind of a filter column, used to bind typed parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Text,
    Number,
    Boolean,
    Date,
    Uuid,
}

impl ScalarKind {
    pub fn of(kind: &FieldKind) -> ScalarKind {
        match kind {
            FieldKind::Number(_) => ScalarKind::Number,
            FieldKind::Boolean => ScalarKind::Boolean,
            FieldKind::Date(_) => ScalarKind::Date,
            FieldKind::Uuid(_) => ScalarKind::Uuid,
            FieldKind::Array(rules) => ScalarKind::of(rules.items.kind()),
            _ => ScalarKind::Text,
        }
    }
}

/// How a filter value was supplied
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCondition {
    /// A bare value, meaning equality
    Literal(Value),
    /// An operator object such as `{"gte": 3, "lt": 9}`
    Operators(BTreeMap<Operator, Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterEntry {
    pub field: String,
    pub kind: ScalarKind,
    pub condition: FilterCondition,
}

/// Filters recorded at one nesting level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterGroup {
    pub combinator: Combinator,
    pub entries: Vec<FilterEntry>,
    pub groups: Vec<FilterGroup>,
}

impl Default for FilterGroup {
    fn default() -> Self {
        Self::new(Combinator::And)
    }
}

impl FilterGroup {
    pub fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            entries: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.groups.iter().all(FilterGroup::is_empty)
    }

    pub fn record(&mut self, field: &str, kind: ScalarKind, condition: FilterCondition) {
        self.entries.push(FilterEntry {
            field: field.to_string(),
            kind,
            condition,
        });
    }
}

/// Operand of a compiled predicate
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateValue {
    Single(Value),
    /// Inclusive `[low, high]`
    Range(Value, Value),
    List(Vec<Value>),
}

impl PredicateValue {
    pub fn to_value(&self) -> Value {
        match self {
            PredicateValue::Single(v) => v.clone(),
            PredicateValue::Range(low, high) => Value::Array(vec![low.clone(), high.clone()]),
            PredicateValue::List(items) => Value::Array(items.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub kind: ScalarKind,
    pub operator: Operator,
    pub value: PredicateValue,
}

/// Storage-agnostic boolean tree of predicates
#[derive(Debug, Clone, PartialEq)]
pub enum QueryCriteria {
    Predicate(Predicate),
    And(Vec<QueryCriteria>),
    Or(Vec<QueryCriteria>),
}

impl Default for QueryCriteria {
    fn default() -> Self {
        QueryCriteria::And(Vec::new())
    }
}

impl QueryCriteria {
    /// True when the tree constrains nothing
    pub fn is_empty(&self) -> bool {
        match self {
            QueryCriteria::Predicate(_) => false,
            QueryCriteria::And(children) | QueryCriteria::Or(children) => {
                children.iter().all(QueryCriteria::is_empty)
            }
        }
    }

    /// Every predicate in the tree, depth first
    pub fn predicates(&self) -> Vec<&Predicate> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Predicate>) {
        match self {
            QueryCriteria::Predicate(p) => out.push(p),
            QueryCriteria::And(children) | QueryCriteria::Or(children) => {
                for child in children {
                    child.collect(out);
                }
            }
        }
    }

    /// Map form: `{"name": {"like": "%abc%"}, "or": [...]}`.
    ///
    /// Predicates on the same field merge into one operator object. A nested
    /// group is written under its combinator key, or appended to `and` when
    /// that key is already taken.
    pub fn to_value(&self) -> Value {
        match self {
            QueryCriteria::Predicate(p) => {
                let mut map = Map::new();
                add_predicate(&mut map, p);
                Value::Object(map)
            }
            QueryCriteria::And(children) => {
                let mut map = Map::new();
                for child in children {
                    match child {
                        QueryCriteria::Predicate(p) => add_predicate(&mut map, p),
                        QueryCriteria::Or(items) if !map.contains_key("or") => {
                            map.insert(
                                "or".to_string(),
                                Value::Array(items.iter().map(QueryCriteria::to_value).collect()),
                            );
                        }
                        nested => push_to(&mut map, "and", nested.to_value()),
                    }
                }
                Value::Object(map)
            }
            QueryCriteria::Or(children) => {
                let mut map = Map::new();
                map.insert(
                    "or".to_string(),
                    Value::Array(children.iter().map(QueryCriteria::to_value).collect()),
                );
                Value::Object(map)
            }
        }
    }
}

impl Serialize for QueryCriteria {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

fn add_predicate(map: &mut Map<String, Value>, predicate: &Predicate) {
    let entry = map
        .entry(predicate.field.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(ops) = entry {
        ops.insert(predicate.operator.as_str().to_string(), predicate.value.to_value());
    }
}

fn push_to(map: &mut Map<String, Value>, key: &str, value: Value) {
    let entry = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(items) = entry {
        items.push(value);
    }
}

/// Maps operators onto a storage backend's syntax
pub trait OperatorDialect {
    fn symbol(&self, operator: Operator) -> &'static str;
}

/// Compile the filters recorded in a validation result
pub fn compile_filters(result: &ValidationResult) -> QueryCriteria {
    compile_group(&result.filters)
}

fn compile_group(group: &FilterGroup) -> QueryCriteria {
    let mut nodes: Vec<QueryCriteria> = group
        .entries
        .iter()
        .flat_map(compile_entry)
        .map(QueryCriteria::Predicate)
        .collect();

    for sub in &group.groups {
        let compiled = compile_group(sub);
        if !compiled.is_empty() {
            nodes.push(compiled);
        }
    }

    match group.combinator {
        Combinator::And => QueryCriteria::And(nodes),
        Combinator::Or => QueryCriteria::Or(nodes),
    }
}

fn compile_entry(entry: &FilterEntry) -> Vec<Predicate> {
    let predicate = |operator, value| Predicate {
        field: entry.field.clone(),
        kind: entry.kind,
        operator,
        value,
    };

    match &entry.condition {
        FilterCondition::Literal(Value::Null) => {
            vec![predicate(Operator::Is, PredicateValue::Single(Value::Null))]
        }
        FilterCondition::Literal(Value::Array(items)) => {
            vec![predicate(Operator::In, PredicateValue::List(items.clone()))]
        }
        FilterCondition::Literal(value) => {
            vec![predicate(Operator::Eq, PredicateValue::Single(value.clone()))]
        }
        FilterCondition::Operators(ops) => ops
            .iter()
            .map(|(op, value)| predicate(*op, operand(*op, value)))
            .collect(),
    }
}

fn operand(operator: Operator, value: &Value) -> PredicateValue {
    match (operator, value) {
        (Operator::Between, Value::Array(pair)) if pair.len() == 2 => {
            PredicateValue::Range(pair[0].clone(), pair[1].clone())
        }
        (Operator::In | Operator::NotIn, Value::Array(items)) => PredicateValue::List(items.clone()),
        _ => PredicateValue::Single(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_with(filters: FilterGroup) -> ValidationResult {
        ValidationResult {
            filters,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_filters_compile_to_empty_and() {
        let criteria = compile_filters(&ValidationResult::default());
        assert_eq!(criteria, QueryCriteria::And(vec![]));
        assert!(criteria.is_empty());
        assert_eq!(criteria.to_value(), json!({}));
    }

    #[test]
    fn test_literal_becomes_equality() {
        let mut group = FilterGroup::default();
        group.record("status", ScalarKind::Text, FilterCondition::Literal(json!("open")));

        let criteria = compile_filters(&result_with(group));
        assert_eq!(criteria.to_value(), json!({"status": {"eq": "open"}}));
    }

    #[test]
    fn test_between_becomes_range() {
        let mut group = FilterGroup::default();
        group.record(
            "price",
            ScalarKind::Number,
            FilterCondition::Operators(BTreeMap::from([(Operator::Between, json!([1, 9]))])),
        );

        let criteria = compile_filters(&result_with(group));
        let predicates = criteria.predicates();
        assert_eq!(predicates.len(), 1);
        assert_eq!(predicates[0].value, PredicateValue::Range(json!(1), json!(9)));
    }

    #[test]
    fn test_operators_on_one_field_merge() {
        let mut group = FilterGroup::default();
        group.record(
            "price",
            ScalarKind::Number,
            FilterCondition::Operators(BTreeMap::from([
                (Operator::Gte, json!(3)),
                (Operator::Lt, json!(9)),
            ])),
        );

        let criteria = compile_filters(&result_with(group));
        assert_eq!(criteria.to_value(), json!({"price": {"gte": 3, "lt": 9}}));
    }

    #[test]
    fn test_or_group_nests_under_or_key() {
        let mut or = FilterGroup::new(Combinator::Or);
        or.record("name", ScalarKind::Text, FilterCondition::Literal(json!("a")));
        or.record("code", ScalarKind::Text, FilterCondition::Literal(json!("AR-0001")));

        let mut root = FilterGroup::default();
        root.record("status", ScalarKind::Text, FilterCondition::Literal(json!("open")));
        root.groups.push(or);

        let criteria = compile_filters(&result_with(root));
        assert_eq!(
            criteria.to_value(),
            json!({
                "status": {"eq": "open"},
                "or": [{"name": {"eq": "a"}}, {"code": {"eq": "AR-0001"}}],
            })
        );
        assert_eq!(serde_json::to_value(&criteria).unwrap(), criteria.to_value());
    }

    #[test]
    fn test_empty_nested_group_is_dropped() {
        let mut root = FilterGroup::default();
        root.groups.push(FilterGroup::new(Combinator::Or));
        assert_eq!(compile_filters(&result_with(root)), QueryCriteria::And(vec![]));
    }

    #[test]
    fn test_literal_list_becomes_membership() {
        let mut group = FilterGroup::default();
        group.record("id", ScalarKind::Uuid, FilterCondition::Literal(json!(["a", "b"])));
        let criteria = compile_filters(&result_with(group));
        assert_eq!(criteria.predicates()[0].operator, Operator::In);
    }
}
