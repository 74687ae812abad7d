//! The backend capability contract shared by all adapters.

use agent_core::{AgentConfig, AgentError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, warn};

/// Strict parse-failure message demanded of the caller on the strict path.
pub const INVALID_JSON_MESSAGE: &str = "LLM returned invalid JSON response. \
    Please try again or adjust your system prompt to ensure valid JSON output.";

/// What an adapter does when a JSON-schema'd reply cannot be parsed.
///
/// Two backends return the fallback envelope (lenient) and two raise a hard
/// error (strict); DESIGN.md records the rationale for the split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePolicy {
    /// Unparseable replies become a `{rawResponse, parsingError}` envelope.
    Lenient,
    /// Unparseable replies are a fatal provider-fault error.
    Strict,
}

/// Capability contract every backend adapter implements.
///
/// `execute` takes an immutable agent snapshot and the validated input value
/// (a string or parsed JSON), performs exactly one outbound call, and returns
/// the normalized reply.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Backend identifier, used for logging and error tagging.
    fn name(&self) -> &'static str;

    /// This adapter's JSON parse-failure policy.
    fn parse_policy(&self) -> ParsePolicy;

    /// Execute the agent's instruction against this backend.
    async fn execute(&self, agent: &AgentConfig, input: &Value) -> Result<Value, AgentError>;
}

/// Decode a reply that the agent's response schema expects to be JSON.
///
/// Structured extraction (fenced block first, raw text second) happens in
/// [`agent_schema::parse_loose`]; this applies the adapter's failure policy.
pub(crate) fn decode_json_reply(
    backend: &'static str,
    raw: &str,
    policy: ParsePolicy,
) -> Result<Value, AgentError> {
    match agent_schema::parse_loose(raw) {
        Ok(value) => Ok(value),
        Err(parse_error) => match policy {
            ParsePolicy::Lenient => {
                warn!(
                    backend,
                    error = %parse_error,
                    "Returning raw response as string due to JSON parsing failure"
                );
                Ok(agent_schema::fallback_envelope(raw))
            }
            ParsePolicy::Strict => {
                error!(
                    backend,
                    error = %parse_error,
                    "Failed to parse backend reply as JSON"
                );
                Err(AgentError::response_format(INVALID_JSON_MESSAGE))
            }
        },
    }
}

/// Translate a non-2xx provider reply into a typed error.
///
/// All four providers use an `{"error": {"message": ...}}` envelope; when it
/// cannot be read, the per-backend default message is used instead.
pub(crate) fn provider_error(
    backend: &'static str,
    status: u16,
    body: &str,
    default_message: &str,
) -> AgentError {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: Option<ErrorDetail>,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }

    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|detail| detail.message)
        .unwrap_or_else(|| default_message.to_string());

    AgentError::provider(backend, message, Some(status))
}

/// Translate a transport-level failure (no HTTP status received).
pub(crate) fn transport_error(backend: &'static str, error: &reqwest::Error) -> AgentError {
    error!(backend, error = %error, "Provider request failed");
    AgentError::provider(backend, format!("Request failed: {error}"), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lenient_policy_wraps_unparseable_replies() {
        let result = decode_json_reply("ChatGPT", "plain prose", ParsePolicy::Lenient).unwrap();
        assert!(agent_schema::is_fallback_envelope(&result));
        assert_eq!(result["rawResponse"], "plain prose");
    }

    #[test]
    fn strict_policy_rejects_unparseable_replies() {
        let err = decode_json_reply("Gemini", "plain prose", ParsePolicy::Strict).unwrap_err();
        assert!(err.is_response_validation());
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn both_policies_accept_fenced_json() {
        let raw = "Sure:\n```json\n{\"ok\": true}\n```";
        for policy in [ParsePolicy::Lenient, ParsePolicy::Strict] {
            let value = decode_json_reply("Deepseek", raw, policy).unwrap();
            assert_eq!(value, json!({"ok": true}));
        }
    }

    #[test]
    fn provider_error_extracts_upstream_message() {
        let body = r#"{"error": {"message": "Rate limit exceeded"}}"#;
        let err = provider_error("ChatGPT", 429, body, "Failed to execute ChatGPT prompt");
        assert_eq!(err.status_code(), 429);
        assert_eq!(err.to_string(), "Rate limit exceeded");
    }

    #[test]
    fn provider_error_falls_back_to_default_message() {
        let err = provider_error("Gemini", 502, "<html>bad gateway</html>", "Failed to execute Gemini prompt");
        assert_eq!(err.status_code(), 502);
        assert_eq!(err.to_string(), "Failed to execute Gemini prompt");
    }
}
