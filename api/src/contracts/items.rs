//! Order line items, addressed through their order

use validation::operators::RANGE_OPERATORS;
use validation::{fields, FieldSchema, RequestSchema, SchemaError};

use super::common::{create_body, id_params, list_query, managed_keys, timestamp_filters, update_body};

pub const ATTRIBUTES: &[&str] = &[
    "id",
    "order_id",
    "description",
    "quantity",
    "unit_price",
    "created_at",
    "updated_at",
];
pub const ASSOCIATIONS: &[&str] = &["order"];

fn quantity() -> FieldSchema {
    fields::number().integer().positive().max(100_000.0)
}

fn unit_price() -> FieldSchema {
    fields::number().positive().allow_zero()
}

fn list() -> Result<RequestSchema, SchemaError> {
    let mut filters = vec![
        ("description", fields::filterable_text().optional()),
        ("quantity", fields::filterable(quantity(), RANGE_OPERATORS).optional()),
        ("unit_price", fields::filterable(unit_price(), RANGE_OPERATORS).optional()),
    ];
    filters.extend(timestamp_filters());

    Ok(RequestSchema::new()
        .params(id_params(&["order"])?)
        .query(list_query(filters, ATTRIBUTES, ASSOCIATIONS)?))
}

fn show() -> Result<RequestSchema, SchemaError> {
    Ok(RequestSchema::new().params(id_params(&["order", "item"])?))
}

fn create() -> Result<RequestSchema, SchemaError> {
    let mut body = vec![
        ("description", fields::bounded_text()),
        ("quantity", quantity()),
        ("unit_price", unit_price()),
        ("order_id", fields::identifier().forbidden()),
    ];
    body.extend(managed_keys());

    Ok(RequestSchema::new()
        .params(id_params(&["order"])?)
        .body(create_body(body)?))
}

fn update() -> Result<RequestSchema, SchemaError> {
    let mut body = vec![
        ("description", fields::bounded_text().optional()),
        ("quantity", quantity().optional()),
        ("unit_price", unit_price().optional()),
        ("order_id", fields::identifier().forbidden()),
    ];
    body.extend(managed_keys());

    Ok(RequestSchema::new()
        .params(id_params(&["order", "item"])?)
        .body(update_body(body)?))
}

contract!(ListItems, "items.list", list());
contract!(ShowItem, "items.show", show());
contract!(CreateItem, "items.create", create());
contract!(UpdateItem, "items.update", update());
contract!(DestroyItem, "items.destroy", show());
