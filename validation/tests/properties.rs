use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{json, Value};

use validation::{
    fields, query_contract, ContractLimits, FailureKind, Location, RequestSchema, ValidationRequest,
    Validator,
};

const ALLOWED: &[&str] = &["id", "name", "code", "created_at"];
const POOL: &[&str] = &["id", "name", "code", "created_at", "password", "ghost"];

fn validator() -> Validator {
    Validator::at(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
}

fn schema() -> RequestSchema {
    let query = query_contract(
        [
            ("name", fields::filterable_text().optional()),
            ("active", fields::boolean().optional().as_filter()),
            ("created_at", fields::filterable_date().optional()),
            ("attributes", fields::attribute_list(ALLOWED).optional()),
            ("direction", fields::sort_direction()),
            ("offset", fields::offset()),
            ("limit", fields::limit()),
        ],
        ContractLimits::default(),
    )
    .unwrap();
    RequestSchema::new().query(query)
}

fn arb_number_or_string(range: std::ops::RangeInclusive<i64>) -> impl Strategy<Value = Value> {
    (range, any::<bool>()).prop_map(|(n, as_string)| {
        if as_string {
            json!(n.to_string())
        } else {
            json!(n)
        }
    })
}

fn arb_query() -> impl Strategy<Value = Value> {
    (
        proptest::option::of("[A-Za-z0-9]{1,20}"),
        proptest::option::of(any::<bool>()),
        proptest::option::of(0i64..1_700_000_000_000),
        proptest::sample::subsequence(ALLOWED.to_vec(), 1..=ALLOWED.len()),
        arb_number_or_string(0..=1000),
        arb_number_or_string(1..=100),
    )
        .prop_map(|(name, active, created, attributes, offset, limit)| {
            let mut query = serde_json::Map::new();
            if let Some(name) = name {
                query.insert("name".into(), json!({"iLike": format!("%{}%", name)}));
            }
            if let Some(active) = active {
                query.insert("active".into(), json!(active.to_string()));
            }
            if let Some(created) = created {
                query.insert("created_at".into(), json!({"gte": created}));
            }
            query.insert("attributes".into(), json!(attributes.join(",")));
            query.insert("offset".into(), offset);
            query.insert("limit".into(), limit);
            Value::Object(query)
        })
}

proptest! {
    #[test]
    fn test_validation_is_idempotent(query in proptest::option::of(arb_query())) {
        let schema = schema();
        let request = match query {
            Some(query) => ValidationRequest::new().with_query(query),
            None => ValidationRequest::new(),
        };
        let first = validator().validate(&schema, &request).unwrap();
        let second = validator().validate(&schema, &first.to_request()).unwrap();
        prop_assert_eq!(&first.query, &second.query);
        prop_assert_eq!(&first.filters, &second.filters);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_validation_is_deterministic(query in arb_query()) {
        let schema = schema();
        let request = ValidationRequest::new().with_query(query);
        prop_assert_eq!(
            validator().validate(&schema, &request),
            validator().validate(&schema, &request)
        );
    }

    #[test]
    fn test_allow_list_accepts_only_members(
        picks in proptest::collection::vec(proptest::sample::select(POOL.to_vec()), 1..6)
    ) {
        let request = ValidationRequest::new().with_query(json!({"attributes": picks.join(",")}));
        let outcome = validator().validate(&schema(), &request);

        let all_allowed = picks.iter().all(|p| ALLOWED.contains(p));
        let distinct = picks
            .iter()
            .enumerate()
            .all(|(i, p)| !picks[..i].contains(p));

        match outcome {
            Ok(result) => {
                prop_assert!(all_allowed && distinct);
                let items = result.query["attributes"].as_array().unwrap().clone();
                for item in items {
                    prop_assert!(ALLOWED.contains(&item.as_str().unwrap()));
                }
            }
            Err(err) => {
                prop_assert!(!(all_allowed && distinct));
                if !all_allowed {
                    let enum_failure = err.failures().iter().any(|f| f.kind == FailureKind::Enum);
                    prop_assert!(enum_failure);
                }
            }
        }
    }

    #[test]
    fn test_limit_outside_bounds_is_rejected(limit in prop_oneof![-1000i64..=0, 101i64..=100_000]) {
        let request = ValidationRequest::new().with_query(json!({"limit": limit}));
        let err = validator().validate(&schema(), &request).unwrap_err();
        prop_assert_eq!(err.find(Location::Query, "limit").map(|f| f.kind), Some(FailureKind::Range));
    }

    #[test]
    fn test_limit_inside_bounds_is_kept(limit in 1i64..=100) {
        let request = ValidationRequest::new().with_query(json!({"limit": limit.to_string()}));
        let result = validator().validate(&schema(), &request).unwrap();
        prop_assert_eq!(&result.query["limit"], &json!(limit));
    }
}

#[test]
fn test_defaults_fill_absent_optional_fields() {
    let result = validator()
        .validate(&schema(), &ValidationRequest::new().with_query(json!({})))
        .unwrap();

    assert_eq!(result.query["offset"], json!(0));
    assert_eq!(result.query["limit"], json!(20));
    assert_eq!(result.query["direction"], json!("asc"));
    assert!(!result.query.contains_key("name"));
}

#[test]
fn test_defaults_fill_omitted_query() {
    let result = validator().validate(&schema(), &ValidationRequest::new()).unwrap();

    assert_eq!(result.query["offset"], json!(0));
    assert_eq!(result.query["limit"], json!(20));
    assert_eq!(result.query["direction"], json!("asc"));
}

#[test]
fn test_explicit_values_override_defaults() {
    let request = ValidationRequest::new().with_query(json!({"direction": "desc", "limit": 5}));
    let result = validator().validate(&schema(), &request).unwrap();

    assert_eq!(result.query["direction"], json!("desc"));
    assert_eq!(result.query["limit"], json!(5));
}
