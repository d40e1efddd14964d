use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;
use validation::{FieldFailure, ValidationError};

/// Validation error response body
#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub message: String,
    pub errors: Vec<FieldFailure>,
    pub code: u16,
    pub timestamp: String,
    pub correlation_id: String,
}

impl ValidationErrorResponse {
    pub fn new(errors: Vec<FieldFailure>, correlation_id: String) -> Self {
        let message = match errors.as_slice() {
            [single] => format!("Validation failed for field '{}'", single.qualified_path()),
            many => format!("Validation failed for {} fields", many.len()),
        };

        Self {
            error: "ValidationError".to_string(),
            message,
            errors,
            code: StatusCode::BAD_REQUEST.as_u16(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            correlation_id,
        }
    }
}

/// Rejection returned by the `Validated` extractor
#[derive(Debug)]
pub struct ValidationRejection(pub ValidationError);

impl From<ValidationError> for ValidationRejection {
    fn from(err: ValidationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let correlation_id = Uuid::new_v4().to_string();
        let payload = ValidationErrorResponse::new(self.0.into_failures(), correlation_id.clone());

        let mut response = (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        if let Ok(value) = HeaderValue::from_str(&correlation_id) {
            response
                .headers_mut()
                .insert(header::HeaderName::from_static("x-correlation-id"), value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validation::{FailureKind, Location};

    #[test]
    fn test_single_failure_message_names_the_field() {
        let failures = vec![FieldFailure::new(
            Location::Query,
            "name.bogus",
            FailureKind::UnknownKey,
            "is not allowed",
        )];
        let response = ValidationErrorResponse::new(failures, "abc".to_string());
        assert_eq!(response.message, "Validation failed for field 'query.name.bogus'");
        assert_eq!(response.code, 400);
    }

    #[test]
    fn test_rejection_is_bad_request_with_correlation_header() {
        let err = ValidationError::single(Location::Body, "", FailureKind::Empty, "must not be empty");
        let response = ValidationRejection(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().contains_key("x-correlation-id"));
    }
}
