//! Query-string decoding
//!
//! Decodes `application/x-www-form-urlencoded` query strings with bracket
//! notation into nested JSON, so that operator filters can be written as
//! `?name[like]=%25abc%25&created_at[between][]=2024-01-01&created_at[between][]=2024-02-01`.
//! Every leaf is a string; coercion is the schema's job.

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Deepest bracket nesting honoured; deeper keys are kept literally
pub const MAX_DEPTH: usize = 5;

/// Decode a raw query string (with or without the leading `?`)
pub fn parse_query(raw: &str) -> Value {
    let mut root = Map::new();
    for (key, value) in form_urlencoded::parse(raw.trim_start_matches('?').as_bytes()) {
        if key.is_empty() {
            continue;
        }
        let path = segments(&key);
        insert(&mut root, &path, Value::String(value.into_owned()));
    }
    Value::Object(root)
}

/// Split `a[b][]` into `["a", "b", ""]`. Malformed or over-deep keys come
/// back as a single literal segment.
fn segments(key: &str) -> Vec<String> {
    let literal = || vec![key.to_string()];

    let open = match key.find('[') {
        Some(0) | None => return literal(),
        Some(open) => open,
    };

    let mut out = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return literal();
        }
        let Some(close) = rest.find(']') else {
            return literal();
        };
        out.push(rest[1..close].to_string());
        rest = &rest[close + 1..];
    }

    if out.len() > MAX_DEPTH + 1 {
        return literal();
    }
    out
}

fn is_index(segment: &str) -> bool {
    segment.is_empty() || segment.bytes().all(|b| b.is_ascii_digit())
}

fn insert(target: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };

    match rest {
        [] => merge(target, head, value),
        [last] if is_index(last) => {
            let slot = target
                .entry(head.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            append(slot, value);
        }
        _ => {
            let slot = target
                .entry(head.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            // a key used both as a scalar and as a parent keeps its first form
            if let Value::Object(child) = slot {
                insert(child, rest, value);
            }
        }
    }
}

/// Repeated plain keys collect into an array
fn merge(target: &mut Map<String, Value>, key: &str, value: Value) {
    match target.get_mut(key) {
        None => {
            target.insert(key.to_string(), value);
        }
        Some(existing) => append(existing, value),
    }
}

fn append(slot: &mut Value, value: Value) {
    match slot {
        Value::Array(items) => items.push(value),
        Value::String(_) => {
            let first = slot.take();
            *slot = Value::Array(vec![first, value]);
        }
        _ => {}
    }
}
