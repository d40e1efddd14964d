use validation::{fields, RequestSchema, SchemaError};

use super::common::{create_body, id_params, list_query, managed_keys, timestamp_filters, update_body};

pub const ATTRIBUTES: &[&str] = &["id", "code", "name", "description", "created_at", "updated_at"];
pub const ASSOCIATIONS: &[&str] = &["workers", "customers"];

fn list() -> Result<RequestSchema, SchemaError> {
    let mut filters = vec![
        ("id", fields::filterable_identifier().optional()),
        ("code", fields::code().optional().as_filter()),
        ("name", fields::filterable_text().optional()),
    ];
    filters.extend(timestamp_filters());

    Ok(RequestSchema::new().query(list_query(filters, ATTRIBUTES, ASSOCIATIONS)?))
}

fn show() -> Result<RequestSchema, SchemaError> {
    Ok(RequestSchema::new().params(id_params(&["area"])?))
}

fn create() -> Result<RequestSchema, SchemaError> {
    let mut body = vec![
        ("code", fields::code()),
        ("name", fields::bounded_text()),
        ("description", fields::bounded_text().optional().nullable()),
    ];
    body.extend(managed_keys());

    Ok(RequestSchema::new().body(create_body(body)?))
}

fn update() -> Result<RequestSchema, SchemaError> {
    let mut body = vec![
        ("code", fields::code().optional()),
        ("name", fields::bounded_text().optional()),
        ("description", fields::bounded_text().optional().nullable()),
    ];
    body.extend(managed_keys());

    Ok(RequestSchema::new()
        .params(id_params(&["area"])?)
        .body(update_body(body)?))
}

contract!(ListAreas, "areas.list", list());
contract!(ShowArea, "areas.show", show());
contract!(CreateArea, "areas.create", create());
contract!(UpdateArea, "areas.update", update());
contract!(DestroyArea, "areas.destroy", show());
