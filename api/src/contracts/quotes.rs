use validation::operators::{RANGE_OPERATORS, SET_OPERATORS};
use validation::{fields, FieldSchema, RequestSchema, SchemaError};

use super::common::{create_body, id_params, list_query, managed_keys, timestamp_filters, update_body};

pub const ATTRIBUTES: &[&str] = &[
    "id",
    "customer_id",
    "code",
    "status",
    "total",
    "issued_at",
    "notes",
    "created_at",
    "updated_at",
];
pub const ASSOCIATIONS: &[&str] = &["customer", "orders"];

pub const STATUSES: &[&str] = &["draft", "sent", "accepted", "rejected", "expired"];

fn status() -> FieldSchema {
    fields::enumeration(STATUSES.iter().copied())
}

fn total() -> FieldSchema {
    fields::number().positive().allow_zero()
}

fn list() -> Result<RequestSchema, SchemaError> {
    let mut filters = vec![
        ("customer_id", fields::filterable_identifier().optional()),
        ("code", fields::code().optional().as_filter()),
        ("status", fields::filterable(status(), SET_OPERATORS).optional()),
        ("total", fields::filterable(total(), RANGE_OPERATORS).optional()),
        ("issued_at", fields::filterable_date().optional()),
    ];
    filters.extend(timestamp_filters());

    Ok(RequestSchema::new().query(list_query(filters, ATTRIBUTES, ASSOCIATIONS)?))
}

fn show() -> Result<RequestSchema, SchemaError> {
    Ok(RequestSchema::new().params(id_params(&["quote"])?))
}

fn create() -> Result<RequestSchema, SchemaError> {
    let mut body = vec![
        ("customer_id", fields::identifier()),
        ("code", fields::code()),
        ("status", status().default_value("draft")),
        ("total", total()),
        ("issued_at", fields::iso_date().optional()),
        ("notes", fields::bounded_text().max_length(2000).optional().nullable()),
    ];
    body.extend(managed_keys());

    Ok(RequestSchema::new().body(create_body(body)?))
}

fn update() -> Result<RequestSchema, SchemaError> {
    let mut body = vec![
        ("customer_id", fields::identifier().forbidden()),
        ("code", fields::code().optional()),
        ("status", status().optional()),
        ("total", total().optional()),
        ("issued_at", fields::iso_date().optional()),
        ("notes", fields::bounded_text().max_length(2000).optional().nullable()),
    ];
    body.extend(managed_keys());

    Ok(RequestSchema::new()
        .params(id_params(&["quote"])?)
        .body(update_body(body)?))
}

contract!(ListQuotes, "quotes.list", list());
contract!(ShowQuote, "quotes.show", show());
contract!(CreateQuote, "quotes.create", create());
contract!(UpdateQuote, "quotes.update", update());
contract!(DestroyQuote, "quotes.destroy", show());
