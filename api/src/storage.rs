//! PostgreSQL rendering of compiled filter criteria
//!
//! Appends a WHERE fragment with bound parameters to a `sqlx::QueryBuilder`.
//! Only rendering happens here; the surrounding repository executes the query.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use thiserror::Error;
use uuid::Uuid;
use validation::{Operator, OperatorDialect, Predicate, PredicateValue, QueryCriteria, ScalarKind};

lazy_static! {
    /// Plain unquoted SQL identifier
    static ref COLUMN_REGEX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StorageError {
    #[error("Invalid column identifier: {0}")]
    InvalidColumn(String),
    #[error("Operator '{operator}' on column '{column}' expects {expected}")]
    UnsupportedValue {
        column: String,
        operator: String,
        expected: &'static str,
    },
}

/// Operator symbols understood by PostgreSQL
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl OperatorDialect for PostgresDialect {
    fn symbol(&self, operator: Operator) -> &'static str {
        match operator {
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Between => "BETWEEN",
            Operator::Like | Operator::StartsWith | Operator::EndsWith | Operator::Substring => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::ILike => "ILIKE",
            Operator::NotILike => "NOT ILIKE",
            Operator::Regexp => "~",
            Operator::NotRegexp => "!~",
            Operator::IRegexp => "~*",
            Operator::NotIRegexp => "!~*",
            Operator::In => "= ANY",
            Operator::NotIn => "<> ALL",
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Is => "IS",
            Operator::Not => "IS NOT",
        }
    }
}

/// Render `criteria` as a boolean SQL expression. An empty tree renders `TRUE`.
pub fn push_criteria<'args>(
    qb: &mut QueryBuilder<'args, Postgres>,
    criteria: &QueryCriteria,
) -> Result<(), StorageError> {
    match criteria {
        QueryCriteria::Predicate(predicate) => push_predicate(qb, predicate),
        QueryCriteria::And(children) => push_joined(qb, children, " AND ", "TRUE"),
        QueryCriteria::Or(children) => push_joined(qb, children, " OR ", "FALSE"),
    }
}

fn push_joined<'args>(
    qb: &mut QueryBuilder<'args, Postgres>,
    children: &[QueryCriteria],
    separator: &str,
    empty: &str,
) -> Result<(), StorageError> {
    let children: Vec<&QueryCriteria> = children.iter().filter(|c| !c.is_empty()).collect();
    if children.is_empty() {
        qb.push(empty);
        return Ok(());
    }

    qb.push("(");
    for (i, child) in children.into_iter().enumerate() {
        if i > 0 {
            qb.push(separator);
        }
        push_criteria(qb, child)?;
    }
    qb.push(")");
    Ok(())
}

fn push_predicate<'args>(
    qb: &mut QueryBuilder<'args, Postgres>,
    predicate: &Predicate,
) -> Result<(), StorageError> {
    let column = quote_column(&predicate.field)?;
    let symbol = PostgresDialect.symbol(predicate.operator);
    let unsupported = |expected| StorageError::UnsupportedValue {
        column: predicate.field.clone(),
        operator: predicate.operator.to_string(),
        expected,
    };

    match (predicate.operator, &predicate.value) {
        (Operator::Between, PredicateValue::Range(low, high)) => {
            qb.push(format!("{} BETWEEN ", column));
            push_value(qb, predicate, low)?;
            qb.push(" AND ");
            push_value(qb, predicate, high)?;
        }
        (Operator::In | Operator::NotIn, PredicateValue::List(items)) => {
            qb.push(format!("{} {}(", column, symbol));
            push_list(qb, predicate, items)?;
            qb.push(")");
        }
        (Operator::Is | Operator::Not, PredicateValue::Single(value)) => {
            let literal = match value {
                Value::Null => "NULL",
                Value::Bool(true) => "TRUE",
                Value::Bool(false) => "FALSE",
                _ => return Err(unsupported("null or a boolean")),
            };
            qb.push(format!("{} {} {}", column, symbol, literal));
        }
        (Operator::StartsWith | Operator::EndsWith | Operator::Substring, PredicateValue::Single(value)) => {
            let text = value.as_str().ok_or_else(|| unsupported("a string"))?;
            let escaped = escape_like(text);
            let pattern = match predicate.operator {
                Operator::StartsWith => format!("{}%", escaped),
                Operator::EndsWith => format!("%{}", escaped),
                _ => format!("%{}%", escaped),
            };
            qb.push(format!("{} {} ", column, symbol));
            qb.push_bind(pattern);
        }
        (Operator::Between, _) => return Err(unsupported("a pair of values")),
        (Operator::In | Operator::NotIn, _) => return Err(unsupported("a list of values")),
        (_, PredicateValue::Single(value)) => {
            qb.push(format!("{} {} ", column, symbol));
            push_value(qb, predicate, value)?;
        }
        (_, _) => return Err(unsupported("a single value")),
    }
    Ok(())
}

/// Bind one value with the column's SQL type
fn push_value<'args>(
    qb: &mut QueryBuilder<'args, Postgres>,
    predicate: &Predicate,
    value: &Value,
) -> Result<(), StorageError> {
    let mismatch = |expected| StorageError::UnsupportedValue {
        column: predicate.field.clone(),
        operator: predicate.operator.to_string(),
        expected,
    };

    match predicate.kind {
        ScalarKind::Text => {
            let text = value.as_str().ok_or_else(|| mismatch("a string"))?;
            qb.push_bind(text.to_string());
        }
        ScalarKind::Number => match value.as_i64() {
            Some(n) => {
                qb.push_bind(n);
            }
            None => {
                let n = value.as_f64().ok_or_else(|| mismatch("a number"))?;
                qb.push_bind(n);
            }
        },
        ScalarKind::Boolean => {
            let flag = value.as_bool().ok_or_else(|| mismatch("a boolean"))?;
            qb.push_bind(flag);
        }
        ScalarKind::Date => {
            let at = parse_timestamp(value).ok_or_else(|| mismatch("an RFC 3339 timestamp"))?;
            qb.push_bind(at);
        }
        ScalarKind::Uuid => {
            let id = parse_uuid(value).ok_or_else(|| mismatch("a UUID"))?;
            qb.push_bind(id);
        }
    }
    Ok(())
}

/// Bind a list as one typed array parameter
fn push_list<'args>(
    qb: &mut QueryBuilder<'args, Postgres>,
    predicate: &Predicate,
    items: &[Value],
) -> Result<(), StorageError> {
    let mismatch = |expected| StorageError::UnsupportedValue {
        column: predicate.field.clone(),
        operator: predicate.operator.to_string(),
        expected,
    };

    match predicate.kind {
        ScalarKind::Text => {
            let texts: Option<Vec<String>> = items.iter().map(|v| v.as_str().map(String::from)).collect();
            qb.push_bind(texts.ok_or_else(|| mismatch("strings"))?);
        }
        ScalarKind::Number => {
            let ints: Option<Vec<i64>> = items.iter().map(Value::as_i64).collect();
            match ints {
                Some(ints) => {
                    qb.push_bind(ints);
                }
                None => {
                    let floats: Option<Vec<f64>> = items.iter().map(Value::as_f64).collect();
                    qb.push_bind(floats.ok_or_else(|| mismatch("numbers"))?);
                }
            }
        }
        ScalarKind::Boolean => {
            let flags: Option<Vec<bool>> = items.iter().map(Value::as_bool).collect();
            qb.push_bind(flags.ok_or_else(|| mismatch("booleans"))?);
        }
        ScalarKind::Date => {
            let dates: Option<Vec<DateTime<Utc>>> = items.iter().map(parse_timestamp).collect();
            qb.push_bind(dates.ok_or_else(|| mismatch("RFC 3339 timestamps"))?);
        }
        ScalarKind::Uuid => {
            let ids: Option<Vec<Uuid>> = items.iter().map(parse_uuid).collect();
            qb.push_bind(ids.ok_or_else(|| mismatch("UUIDs"))?);
        }
    }
    Ok(())
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|at| at.with_timezone(&Utc))
}

fn parse_uuid(value: &Value) -> Option<Uuid> {
    value.as_str().and_then(|s| Uuid::parse_str(s).ok())
}

/// Double-quoted column identifier
fn quote_column(field: &str) -> Result<String, StorageError> {
    if COLUMN_REGEX.is_match(field) {
        Ok(format!("\"{}\"", field))
    } else {
        Err(StorageError::InvalidColumn(field.to_string()))
    }
}

/// Escape LIKE wildcards so the value matches literally
fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
