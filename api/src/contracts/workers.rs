//! Workers belong to an area and are addressed through it

use validation::{fields, RequestSchema, SchemaError};

use super::common::{create_body, id_params, list_query, managed_keys, timestamp_filters, update_body};

pub const ATTRIBUTES: &[&str] = &[
    "id",
    "area_id",
    "code",
    "first_name",
    "last_name",
    "hourly_rate",
    "active",
    "created_at",
    "updated_at",
];
pub const ASSOCIATIONS: &[&str] = &["area", "orders"];

fn hourly_rate() -> validation::FieldSchema {
    fields::number().positive().max(10_000.0)
}

fn list() -> Result<RequestSchema, SchemaError> {
    let mut filters = vec![
        ("code", fields::code().optional().as_filter()),
        ("first_name", fields::filterable_text().optional()),
        ("last_name", fields::filterable_text().optional()),
        ("hourly_rate", fields::filterable(hourly_rate(), validation::operators::RANGE_OPERATORS).optional()),
        ("active", fields::boolean().optional().as_filter()),
    ];
    filters.extend(timestamp_filters());

    Ok(RequestSchema::new()
        .params(id_params(&["area"])?)
        .query(list_query(filters, ATTRIBUTES, ASSOCIATIONS)?))
}

fn show() -> Result<RequestSchema, SchemaError> {
    Ok(RequestSchema::new().params(id_params(&["area", "worker"])?))
}

fn create() -> Result<RequestSchema, SchemaError> {
    let mut body = vec![
        ("code", fields::code()),
        ("first_name", fields::bounded_text()),
        ("last_name", fields::bounded_text()),
        ("hourly_rate", hourly_rate()),
        ("active", fields::boolean().default_value(true)),
        ("area_id", fields::identifier().forbidden()),
    ];
    body.extend(managed_keys());

    Ok(RequestSchema::new()
        .params(id_params(&["area"])?)
        .body(create_body(body)?))
}

fn update() -> Result<RequestSchema, SchemaError> {
    let mut body = vec![
        ("code", fields::code().optional()),
        ("first_name", fields::bounded_text().optional()),
        ("last_name", fields::bounded_text().optional()),
        ("hourly_rate", hourly_rate().optional()),
        ("active", fields::boolean().optional()),
        ("area_id", fields::identifier().optional()),
    ];
    body.extend(managed_keys());

    Ok(RequestSchema::new()
        .params(id_params(&["area", "worker"])?)
        .body(update_body(body)?))
}

contract!(ListWorkers, "workers.list", list());
contract!(ShowWorker, "workers.show", show());
contract!(CreateWorker, "workers.create", create());
contract!(UpdateWorker, "workers.update", update());
contract!(DestroyWorker, "workers.destroy", show());
