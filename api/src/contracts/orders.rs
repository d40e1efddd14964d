use validation::operators::SET_OPERATORS;
use validation::{fields, FieldSchema, RequestSchema, SchemaError};

use super::common::{create_body, id_params, list_query, managed_keys, timestamp_filters, update_body};

pub const ATTRIBUTES: &[&str] = &[
    "id",
    "customer_id",
    "quote_id",
    "worker_id",
    "code",
    "status",
    "ordered_at",
    "completed_at",
    "created_at",
    "updated_at",
];
pub const ASSOCIATIONS: &[&str] = &["customer", "quote", "worker", "items"];

pub const STATUSES: &[&str] = &["pending", "scheduled", "in_progress", "completed", "cancelled"];

fn status() -> FieldSchema {
    fields::enumeration(STATUSES.iter().copied())
}

fn list() -> Result<RequestSchema, SchemaError> {
    let mut filters = vec![
        ("customer_id", fields::filterable_identifier().optional()),
        ("quote_id", fields::filterable_identifier().optional()),
        ("worker_id", fields::filterable_identifier().optional()),
        ("code", fields::code().optional().as_filter()),
        ("status", fields::filterable(status(), SET_OPERATORS).optional()),
        ("ordered_at", fields::filterable_date().optional()),
        // `?completed_at[is]=null` for open orders
        (
            "completed_at",
            fields::filterable(fields::iso_date(), &[validation::Operator::Is, validation::Operator::Not])
                .optional(),
        ),
    ];
    filters.extend(timestamp_filters());

    Ok(RequestSchema::new().query(list_query(filters, ATTRIBUTES, ASSOCIATIONS)?))
}

fn show() -> Result<RequestSchema, SchemaError> {
    Ok(RequestSchema::new().params(id_params(&["order"])?))
}

fn create() -> Result<RequestSchema, SchemaError> {
    let mut body = vec![
        ("customer_id", fields::identifier()),
        ("quote_id", fields::identifier().optional().nullable()),
        ("worker_id", fields::identifier().optional().nullable()),
        ("code", fields::code()),
        ("status", status().default_value("pending")),
        ("ordered_at", fields::iso_date()),
        ("completed_at", fields::iso_date().forbidden()),
    ];
    body.extend(managed_keys());

    Ok(RequestSchema::new().body(create_body(body)?))
}

fn update() -> Result<RequestSchema, SchemaError> {
    let mut body = vec![
        ("customer_id", fields::identifier().forbidden()),
        ("quote_id", fields::identifier().optional().nullable()),
        ("worker_id", fields::identifier().optional().nullable()),
        ("code", fields::code().optional()),
        ("status", status().optional()),
        ("ordered_at", fields::iso_date().optional()),
        ("completed_at", fields::iso_date().optional().nullable()),
    ];
    body.extend(managed_keys());

    Ok(RequestSchema::new()
        .params(id_params(&["order"])?)
        .body(update_body(body)?))
}

contract!(ListOrders, "orders.list", list());
contract!(ShowOrder, "orders.show", show());
contract!(CreateOrder, "orders.create", create());
contract!(UpdateOrder, "orders.update", update());
contract!(DestroyOrder, "orders.destroy", show());
