//! API error responses.

use agent_core::AgentError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

const REQUEST_SCHEMA_HINT: &str = "The request does not match the required schema. \
    Please check the API documentation for the correct format.";
const RESPONSE_SCHEMA_MESSAGE: &str =
    "The AI model generated an invalid response that doesn't match the required schema.";

/// An error ready to be serialized as an HTTP response.
///
/// Every error body has the same shape: `status` is always `"error"`,
/// `message` says what went wrong, and `details` optionally adds a hint for
/// the caller.
#[derive(Debug)]
pub struct ApiError {
    status_code: StatusCode,
    status: &'static str,
    message: String,
    details: Option<String>,
}

impl ApiError {
    /// Build an error with the given HTTP status and message.
    #[must_use]
    pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code,
            status: "error",
            message: message.into(),
            details: None,
        }
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Attach a caller-facing hint.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<AgentError> for ApiError {
    fn from(error: AgentError) -> Self {
        let status_code =
            StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if error.is_request_validation() {
            return Self::new(status_code, error.to_string()).with_details(REQUEST_SCHEMA_HINT);
        }

        if error.is_response_validation() {
            return Self::new(status_code, RESPONSE_SCHEMA_MESSAGE)
                .with_details(error.to_string());
        }

        Self::new(status_code, error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "status": self.status,
            "message": self.message,
        });
        let mut body = body;
        if let Some(details) = self.details {
            body["details"] = json!(details);
        }
        (self.status_code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_validation_errors_carry_the_schema_hint() {
        let err: ApiError = AgentError::RequestField {
            field: "topic".to_string(),
            message: "Missing required request field: topic".to_string(),
        }
        .into();
        assert_eq!(err.status_code, StatusCode::BAD_REQUEST);
        assert_eq!(err.details.as_deref(), Some(REQUEST_SCHEMA_HINT));
    }

    #[test]
    fn response_validation_errors_replace_the_message() {
        let err: ApiError =
            AgentError::response_format("Invalid response format: Expected an object").into();
        assert_eq!(err.status_code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, RESPONSE_SCHEMA_MESSAGE);
        assert_eq!(
            err.details.as_deref(),
            Some("Invalid response format: Expected an object")
        );
    }

    #[test]
    fn not_implemented_maps_to_501() {
        let err: ApiError = AgentError::not_implemented("Grok").into();
        assert_eq!(err.status_code, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(err.message, "Grok service is not yet implemented");
    }
}
