//! Axum extractor for contract-validated requests
//!
//! `Validated<C>` runs the endpoint's contract over path parameters, the
//! query string and the JSON body before the handler is called, and hands the
//! handler normalized values plus the compiled filter criteria.

use std::collections::HashMap;
use std::marker::PhantomData;

use axum::{
    async_trait,
    body::to_bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
};
use serde_json::{Map, Value};
use validation::{
    compile_filters, parse_query, FailureKind, Location, QueryCriteria, RequestSchema,
    ValidationError, ValidationRequest, ValidationResult,
};

use crate::config;
use crate::error::ValidationRejection;

/// Largest JSON body read for validation
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// A published endpoint contract
pub trait Contract: Send + Sync + 'static {
    /// `entity.operation`, used in logs
    const NAME: &'static str;

    fn schema() -> &'static RequestSchema;
}

/// Request data that passed contract `C`
///
/// # Example
///
/// ```ignore
/// pub async fn list_areas(
///     Validated { data, criteria, .. }: Validated<ListAreas>,
/// ) -> impl IntoResponse {
///     // data.query["limit"] is a number between 1 and 100
/// }
/// ```
pub struct Validated<C> {
    pub data: ValidationResult,
    pub criteria: QueryCriteria,
    _contract: PhantomData<C>,
}

impl<C> Validated<C> {
    pub fn into_parts(self) -> (ValidationResult, QueryCriteria) {
        (self.data, self.criteria)
    }
}

#[async_trait]
impl<S, C> FromRequest<S> for Validated<C>
where
    C: Contract,
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let schema = C::schema();
        let (mut parts, body) = req.into_parts();

        // Step 1: path parameters; a route without any leaves params absent
        let params = Path::<HashMap<String, String>>::from_request_parts(&mut parts, state)
            .await
            .ok()
            .map(|Path(map)| {
                Value::Object(
                    map.into_iter()
                        .map(|(k, v)| (k, Value::String(v)))
                        .collect::<Map<String, Value>>(),
                )
            });

        // Step 2: query string
        let query = parse_query(parts.uri.query().unwrap_or_default());

        // Step 3: JSON body, only for contracts that declare one
        let body = if schema.body_schema().is_some() {
            let bytes = to_bytes(body, MAX_BODY_BYTES).await.map_err(|_| {
                ValidationError::single(
                    Location::Body,
                    "",
                    FailureKind::Type,
                    "could not be read",
                )
            })?;
            if bytes.is_empty() {
                None
            } else {
                let value = serde_json::from_slice::<Value>(&bytes).map_err(|e| {
                    ValidationError::single(
                        Location::Body,
                        "",
                        FailureKind::Type,
                        format!("must be valid JSON: {}", e),
                    )
                })?;
                Some(value)
            }
        } else {
            None
        };

        // Step 4: validate and compile filters
        let request = ValidationRequest {
            params,
            query: Some(query),
            body,
        };
        let data = config::engine()
            .validator()
            .validate(schema, &request)
            .map_err(|err| {
                tracing::debug!(contract = C::NAME, failures = err.len(), "request rejected");
                ValidationRejection(err)
            })?;
        let criteria = compile_filters(&data);

        Ok(Validated {
            data,
            criteria,
            _contract: PhantomData,
        })
    }
}
