//! Custom Axum extractors.

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header;
use serde_json::Value;

use crate::error::ApiError;

/// The body of an agent execution request.
///
/// Accepts both structured and plain-text agents with one extractor:
/// - `application/json` bodies must parse as JSON
/// - `text/plain` bodies become a JSON string value
/// - without a content type, JSON is tried first and the raw text kept
///   otherwise
#[derive(Debug, Clone)]
pub struct AgentBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for AgentBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::bad_request("Failed to read request body"))?;

        if bytes.is_empty() {
            return Err(ApiError::bad_request("Request body cannot be empty"));
        }

        let text = std::str::from_utf8(&bytes)
            .map_err(|_| ApiError::bad_request("Request body must be valid UTF-8"))?;

        let is_json = content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with(mime::APPLICATION_JSON.essence_str()));
        let is_text = content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with(mime::TEXT_PLAIN.essence_str()));

        if is_json {
            let value = serde_json::from_str(text).map_err(|_| {
                ApiError::bad_request("Invalid request format: Expected valid JSON")
            })?;
            return Ok(Self(value));
        }

        if is_text {
            return Ok(Self(Value::String(text.to_string())));
        }

        // No declared content type: structured if it parses, raw text if not.
        match serde_json::from_str(text) {
            Ok(value) => Ok(Self(value)),
            Err(_) => Ok(Self(Value::String(text.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use serde_json::json;

    async fn extract(content_type: Option<&str>, body: &str) -> Result<Value, ApiError> {
        let mut builder = HttpRequest::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        AgentBody::from_request(request, &()).await.map(|b| b.0)
    }

    #[tokio::test]
    async fn json_bodies_parse_as_json() {
        let value = extract(Some("application/json"), r#"{"topic": "rust"}"#)
            .await
            .unwrap();
        assert_eq!(value, json!({"topic": "rust"}));
    }

    #[tokio::test]
    async fn malformed_json_with_json_content_type_is_rejected() {
        use axum::response::IntoResponse;

        let err = extract(Some("application/json"), "{not json").await.unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn text_bodies_become_string_values() {
        let value = extract(Some("text/plain"), r#"{"looks": "like json"}"#)
            .await
            .unwrap();
        assert_eq!(value, json!(r#"{"looks": "like json"}"#));
    }

    #[tokio::test]
    async fn untyped_bodies_try_json_first() {
        assert_eq!(extract(None, "[1, 2]").await.unwrap(), json!([1, 2]));
        assert_eq!(extract(None, "just words").await.unwrap(), json!("just words"));
    }

    #[tokio::test]
    async fn empty_bodies_are_rejected() {
        assert!(extract(None, "").await.is_err());
    }
}
