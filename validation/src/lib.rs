//! Request Validation Engine
//!
//! Declarative validation for the CRUD backend's path parameters, query
//! strings and JSON bodies, plus compilation of validated query filters into
//! a storage-agnostic criteria tree.
//!
//! # Overview
//!
//! 1. **Fields** - reusable builders (`identifier`, `code`, `bounded_text`,
//!    `limit`, ...) refined per entity with modifiers
//! 2. **Contracts** - `query_contract`, `body_contract` and `params_contract`
//!    assemble fields into sealed object schemas
//! 3. **Validator** - interprets a `RequestSchema` against raw input and
//!    returns normalized values or every failure found
//! 4. **Filters** - `compile_filters` turns validated filter fields into
//!    `QueryCriteria`
//!
//! # Usage
//!
//! ```ignore
//! use validation::{fields, query_contract, ContractLimits, RequestSchema, ValidationRequest};
//!
//! let schema = RequestSchema::new().query(query_contract(
//!     [("name", fields::filterable_text().optional()), ("limit", fields::limit())],
//!     ContractLimits::default(),
//! )?);
//!
//! let result = validation::validate(&schema, &ValidationRequest::new().with_query(query))?;
//! let criteria = validation::compile_filters(&result);
//! ```

pub mod checks;
pub mod config;
pub mod error;
pub mod fields;
pub mod filters;
pub mod operators;
pub mod querystring;
pub mod schema;
pub mod transforms;
pub mod validator;

pub use config::{ConfigError, EngineConfig, PaginationConfig};
pub use error::{FailureKind, FieldFailure, Location, SchemaError, ValidationError};
pub use filters::{
    compile_filters, FilterCondition, FilterEntry, FilterGroup, OperatorDialect, Predicate,
    PredicateValue, QueryCriteria, ScalarKind,
};
pub use operators::{Combinator, Operator};
pub use querystring::parse_query;
pub use schema::{
    body_contract, params_contract, query_contract, ContractLimits, FieldKind, FieldSchema,
    ObjectSchema, Presence, RequestSchema, UnknownKeys,
};
pub use transforms::{ParseTarget, Transform};
pub use validator::{validate, ValidateOptions, ValidationRequest, ValidationResult, Validator};
