//! Building blocks shared by the entity contracts

use validation::{
    body_contract, fields, params_contract, query_contract, ContractLimits, FieldSchema,
    ObjectSchema, SchemaError,
};

use crate::config;

/// Path parameters made of identifiers only
pub fn id_params(names: &[&'static str]) -> Result<ObjectSchema, SchemaError> {
    params_contract(
        names.iter().map(|name| (*name, fields::identifier())),
        ContractLimits::default(),
    )
}

/// List query: entity filters plus pagination, projection, eager loading
/// and sorting
pub fn list_query(
    filters: Vec<(&'static str, FieldSchema)>,
    attributes: &[&str],
    associations: &[&str],
) -> Result<ObjectSchema, SchemaError> {
    let engine = config::engine();

    let mut all = filters;
    all.extend(fields::pagination(&engine.pagination));
    all.push(("attributes", fields::attribute_list(attributes).optional()));
    if !associations.is_empty() {
        all.push(("include", fields::association_list(associations).optional()));
    }
    all.push(("sort", fields::sort_by(attributes)));
    all.push(("direction", fields::sort_direction()));

    query_contract(all, engine.query_limits())
}

/// Body for partial updates: at least one field must be supplied
pub fn update_body(fields: Vec<(&'static str, FieldSchema)>) -> Result<ObjectSchema, SchemaError> {
    body_contract(
        fields,
        ContractLimits {
            min_keys: Some(1),
            ..Default::default()
        },
    )
}

pub fn create_body(fields: Vec<(&'static str, FieldSchema)>) -> Result<ObjectSchema, SchemaError> {
    body_contract(fields, ContractLimits::default())
}

/// `created_at` / `updated_at` range filters
pub fn timestamp_filters() -> Vec<(&'static str, FieldSchema)> {
    vec![
        ("created_at", fields::filterable_date().optional()),
        ("updated_at", fields::filterable_date().optional()),
    ]
}

/// Server-managed keys a client must never write
pub fn managed_keys() -> Vec<(&'static str, FieldSchema)> {
    vec![
        ("id", fields::identifier().forbidden()),
        ("created_at", fields::iso_date().forbidden()),
        ("updated_at", fields::iso_date().forbidden()),
    ]
}
