use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use validation::{
    body_contract, compile_filters, fields, params_contract, query_contract, ContractLimits,
    FailureKind, Location, Operator, RequestSchema, ValidationRequest, Validator,
};

fn validator() -> Validator {
    Validator::at(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
}

fn list_schema() -> RequestSchema {
    let query = query_contract(
        [
            ("name", fields::filterable_text().optional()),
            ("code", fields::code().optional().as_filter()),
            ("created_at", fields::filterable_date().optional()),
            ("quantity", fields::filterable_number().optional()),
            ("attributes", fields::attribute_list(&["id", "name"]).optional()),
            ("offset", fields::offset()),
            ("limit", fields::limit()),
        ],
        ContractLimits {
            max_keys: Some(16),
            ..Default::default()
        },
    )
    .unwrap();
    RequestSchema::new().query(query)
}

fn create_schema() -> RequestSchema {
    let body = body_contract(
        [
            ("name", fields::bounded_text()),
            ("code", fields::code()),
            ("description", fields::bounded_text().optional().nullable()),
        ],
        ContractLimits::default(),
    )
    .unwrap();
    RequestSchema::new().body(body)
}

fn show_schema() -> RequestSchema {
    let params = params_contract([("entity", fields::identifier())], ContractLimits::default()).unwrap();
    RequestSchema::new().params(params)
}

#[test]
fn test_pagination_strings_are_coerced() {
    let request = ValidationRequest::new().with_query(json!({"limit": "20", "offset": "5"}));
    let result = validator().validate(&list_schema(), &request).unwrap();

    assert_eq!(Value::Object(result.query), json!({"limit": 20, "offset": 5}));
}

#[test]
fn test_like_filter_compiles_to_criteria() {
    let request = ValidationRequest::new().with_query(json!({"name": {"like": "%abc%"}}));
    let result = validator().validate(&list_schema(), &request).unwrap();

    assert_eq!(result.query["name"], json!({"like": "%abc%"}));
    let criteria = compile_filters(&result);
    assert_eq!(criteria.to_value(), json!({"name": {"like": "%abc%"}}));
}

#[test]
fn test_unknown_operator_is_reported_at_its_path() {
    let request = ValidationRequest::new().with_query(json!({"name": {"like": "%abc%", "bogus": 1}}));
    let err = validator().validate(&list_schema(), &request).unwrap_err();

    let failure = err.find(Location::Query, "name.bogus").expect("failure at name.bogus");
    assert_eq!(failure.kind, FailureKind::UnknownKey);
    assert_eq!(failure.qualified_path(), "query.name.bogus");
}

#[test]
fn test_malformed_identifier_is_a_type_failure() {
    let request = ValidationRequest::new().with_params(json!({"entity": "not-a-uuid"}));
    let err = validator().validate(&show_schema(), &request).unwrap_err();

    assert_eq!(err.len(), 1);
    assert_eq!(err.failures()[0].kind, FailureKind::Type);
    assert_eq!(err.failures()[0].path, "entity");
}

#[test]
fn test_identifier_is_normalized_to_lowercase() {
    let request = ValidationRequest::new()
        .with_params(json!({"entity": " 3F2504E0-4F89-41D3-9A0C-0305E82C3301 "}));
    let result = validator().validate(&show_schema(), &request).unwrap();
    assert_eq!(result.params["entity"], json!("3f2504e0-4f89-41d3-9a0c-0305e82c3301"));
}

#[test]
fn test_attribute_outside_allow_list_is_an_enum_failure() {
    let request = ValidationRequest::new().with_query(json!({"attributes": "id,name,ghost"}));
    let err = validator().validate(&list_schema(), &request).unwrap_err();

    let failure = err.find(Location::Query, "attributes[2]").expect("failure for ghost");
    assert_eq!(failure.kind, FailureKind::Enum);
}

#[test]
fn test_attribute_list_accepts_members() {
    let request = ValidationRequest::new().with_query(json!({"attributes": " id , name "}));
    let result = validator().validate(&list_schema(), &request).unwrap();
    assert_eq!(result.query["attributes"], json!(["id", "name"]));
}

#[test]
fn test_empty_body_fails_before_field_checks() {
    let request = ValidationRequest::new().with_body(json!({}));
    let err = validator().validate(&create_schema(), &request).unwrap_err();

    assert_eq!(err.len(), 1);
    let failure = &err.failures()[0];
    assert_eq!(failure.kind, FailureKind::Empty);
    assert_eq!(failure.location, Location::Body);
    assert_eq!(failure.path, "");
}

#[test]
fn test_missing_body_is_required() {
    let err = validator()
        .validate(&create_schema(), &ValidationRequest::new())
        .unwrap_err();
    assert_eq!(err.failures()[0].kind, FailureKind::Required);
}

#[test]
fn test_limit_above_cap_is_rejected_not_clamped() {
    for limit in [json!(101), json!("101"), json!(0), json!(2.5)] {
        let request = ValidationRequest::new().with_query(json!({"limit": limit}));
        let err = validator().validate(&list_schema(), &request).unwrap_err();
        assert!(err.find(Location::Query, "limit").is_some());
    }
}

#[test]
fn test_operators_outside_the_declared_set_are_rejected() {
    let cases = [
        ("name", Operator::Gt, json!("a")),
        ("created_at", Operator::Like, json!("2024%")),
        ("quantity", Operator::ILike, json!("1%")),
        ("code", Operator::Between, json!(["AR-0001", "AR-0009"])),
    ];

    for (field, op, value) in cases {
        let mut filter = serde_json::Map::new();
        filter.insert(op.as_str().to_string(), value);
        let mut query = serde_json::Map::new();
        query.insert(field.to_string(), Value::Object(filter));

        let request = ValidationRequest::new().with_query(Value::Object(query));
        assert!(
            validator().validate(&list_schema(), &request).is_err(),
            "{} accepted {}",
            field,
            op
        );
    }
}

#[test]
fn test_range_operators_compile_with_normalized_values() {
    let request = ValidationRequest::new().with_query(json!({
        "quantity": {"gte": "3", "lt": "9"},
        "created_at": {"between": ["2024-01-01", "2024-01-31T12:00:00Z"]},
        "code": "AR-0001",
    }));
    let result = validator().validate(&list_schema(), &request).unwrap();

    assert_eq!(
        compile_filters(&result).to_value(),
        json!({
            "code": {"eq": "AR-0001"},
            "created_at": {"between": ["2024-01-01T00:00:00.000Z", "2024-01-31T12:00:00.000Z"]},
            "quantity": {"gte": 3, "lt": 9},
        })
    );
}

#[test]
fn test_body_failures_are_aggregated() {
    let request = ValidationRequest::new().with_body(json!({
        "name": "<script>alert(1)</script>",
        "code": "ar-1",
        "extra": true,
    }));
    let err = validator().validate(&create_schema(), &request).unwrap_err();

    assert_eq!(err.find(Location::Body, "name").unwrap().kind, FailureKind::Pattern);
    assert_eq!(err.find(Location::Body, "code").unwrap().kind, FailureKind::Pattern);
    assert_eq!(err.find(Location::Body, "extra").unwrap().kind, FailureKind::UnknownKey);
}

#[test]
fn test_too_many_query_keys_are_rejected() {
    let mut query = serde_json::Map::new();
    for i in 0..17 {
        query.insert(format!("k{}", i), json!("x"));
    }
    let request = ValidationRequest::new().with_query(Value::Object(query));
    let err = validator().validate(&list_schema(), &request).unwrap_err();

    assert_eq!(err.len(), 1);
    assert_eq!(err.failures()[0].kind, FailureKind::TooManyKeys);
}
