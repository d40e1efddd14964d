//! Schema algebra
//!
//! Field and object schemas are plain data. They are checked and sealed once,
//! when a contract is built, and are read-only afterwards.

mod field;
mod object;

pub use field::{
    ArrayRules, DateBound, DateRules, FieldKind, FieldSchema, NumberRules, Pattern, Presence,
    StringRules, UuidRules,
};
pub use object::{
    body_contract, params_contract, query_contract, ContractLimits, ObjectSchema, RequestSchema,
    UnknownKeys,
};
