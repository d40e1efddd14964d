use validation::{fields, RequestSchema, SchemaError};

use super::common::{create_body, id_params, list_query, managed_keys, timestamp_filters, update_body};

pub const ATTRIBUTES: &[&str] = &[
    "id",
    "area_id",
    "code",
    "name",
    "email",
    "phone",
    "vip",
    "created_at",
    "updated_at",
];
pub const ASSOCIATIONS: &[&str] = &["area", "quotes", "orders"];

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$";
const PHONE_PATTERN: &str = r"^\+?[0-9 ()-]{6,20}$";

fn email() -> validation::FieldSchema {
    fields::bounded_text().pattern(EMAIL_PATTERN)
}

fn phone() -> validation::FieldSchema {
    fields::bounded_text().max_length(20).pattern(PHONE_PATTERN)
}

fn list() -> Result<RequestSchema, SchemaError> {
    let mut filters = vec![
        ("area_id", fields::filterable_identifier().optional()),
        ("vip", fields::boolean().optional().as_filter()),
        // `?or[name][iLike]=%25smith%25&or[code]=CU-0001`
        (
            "or",
            fields::any_of([
                ("code", fields::code().optional().as_filter()),
                ("name", fields::filterable_text().optional()),
                ("email", fields::filterable_text().optional()),
            ]),
        ),
    ];
    filters.extend(timestamp_filters());

    Ok(RequestSchema::new().query(list_query(filters, ATTRIBUTES, ASSOCIATIONS)?))
}

fn show() -> Result<RequestSchema, SchemaError> {
    Ok(RequestSchema::new().params(id_params(&["customer"])?))
}

fn create() -> Result<RequestSchema, SchemaError> {
    let mut body = vec![
        ("area_id", fields::identifier()),
        ("code", fields::code()),
        ("name", fields::bounded_text()),
        ("email", email().optional().nullable()),
        ("phone", phone().optional().nullable()),
        ("vip", fields::boolean().default_value(false)),
    ];
    body.extend(managed_keys());

    Ok(RequestSchema::new().body(create_body(body)?))
}

fn update() -> Result<RequestSchema, SchemaError> {
    let mut body = vec![
        ("area_id", fields::identifier().optional()),
        ("code", fields::code().optional()),
        ("name", fields::bounded_text().optional()),
        ("email", email().optional().nullable()),
        ("phone", phone().optional().nullable()),
        ("vip", fields::boolean().optional()),
    ];
    body.extend(managed_keys());

    Ok(RequestSchema::new()
        .params(id_params(&["customer"])?)
        .body(update_body(body)?))
}

contract!(ListCustomers, "customers.list", list());
contract!(ShowCustomer, "customers.show", show());
contract!(CreateCustomer, "customers.create", create());
contract!(UpdateCustomer, "customers.update", update());
contract!(DestroyCustomer, "customers.destroy", show());
