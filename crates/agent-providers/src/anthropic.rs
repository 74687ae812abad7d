//! Anthropic Claude messages adapter.
//!
//! Auth: `x-api-key` header plus a pinned `anthropic-version`. The system
//! prompt travels in the dedicated `system` field. Text lives at
//! `content[0].text`. Parse policy: lenient.
//!
//! Claude sometimes returns its JSON double-encoded as a quoted string, or
//! with Markdown fences nested inside string values; both get normalized
//! before and after decoding.

use agent_core::{AgentConfig, AgentError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::backend::{decode_json_reply, provider_error, transport_error, LlmBackend, ParsePolicy};
use crate::prompt;

const BACKEND_NAME: &str = "Claude";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
const DEFAULT_ERROR: &str = "Failed to execute Claude prompt";
const ANTHROPIC_VERSION: &str = "2024-02-15";

/// Claude adapter configuration.
#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    /// API base URL.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Outbound request timeout.
    pub timeout: Duration,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl ClaudeConfig {
    /// Override the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Claude backend adapter.
pub struct ClaudeBackend {
    config: ClaudeConfig,
    client: Client,
}

impl ClaudeBackend {
    /// Create the adapter with its own HTTP client.
    pub fn new(config: ClaudeConfig) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn build_request(&self, agent: &AgentConfig, input: &Value) -> MessagesRequest {
        MessagesRequest {
            model: self.config.model.clone(),
            system: prompt::compose_system_prompt(agent),
            messages: vec![ClaudeMessage {
                role: "user",
                content: prompt::render_input(input),
            }],
            temperature: 0.7,
            max_tokens: 4096,
            top_p: 0.95,
        }
    }
}

#[async_trait]
impl LlmBackend for ClaudeBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn parse_policy(&self) -> ParsePolicy {
        ParsePolicy::Lenient
    }

    async fn execute(&self, agent: &AgentConfig, input: &Value) -> Result<Value, AgentError> {
        let url = format!("{}/messages", self.config.base_url);
        let request = self.build_request(agent, input);

        debug!(
            backend = BACKEND_NAME,
            agent = %agent.name,
            model = %self.config.model,
            "Sending messages request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", agent.credential.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(BACKEND_NAME, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(BACKEND_NAME, &e))?;

        if !status.is_success() {
            return Err(provider_error(
                BACKEND_NAME,
                status.as_u16(),
                &body,
                DEFAULT_ERROR,
            ));
        }

        let reply: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            AgentError::provider(BACKEND_NAME, format!("Invalid response JSON: {e}"), None)
        })?;

        let raw = reply
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .unwrap_or_default();

        if prompt::response_wants_json(agent) {
            let unquoted = agent_schema::unwrap_quoted(&raw);
            let mut value = decode_json_reply(BACKEND_NAME, &unquoted, self.parse_policy())?;
            if !agent_schema::is_fallback_envelope(&value) {
                agent_schema::strip_nested_fences(&mut value);
            }
            Ok(value)
        } else {
            Ok(Value::String(raw))
        }
    }
}

// Anthropic wire types

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    system: String,
    messages: Vec<ClaudeMessage>,
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{Backend, Credential, Schema};
    use chrono::Utc;
    use serde_json::json;

    fn test_agent(instruction: &str) -> AgentConfig {
        AgentConfig {
            id: "a1".to_string(),
            name: "tester".to_string(),
            backend: Backend::Claude,
            credential: Credential::new("sk-ant-test"),
            route_path: "/api/test".to_string(),
            instruction: instruction.to_string(),
            request_schema: None,
            response_schema: Some(Schema::json(vec![])),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn system_prompt_travels_in_the_system_field() {
        let backend = ClaudeBackend::new(ClaudeConfig::default()).unwrap();
        let request = backend.build_request(&test_agent("Be concise"), &json!("hi"));

        assert!(request.system.starts_with("Be concise"));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.messages[0].content, "hi");
    }

    #[test]
    fn empty_instruction_still_sends_a_system_field() {
        let backend = ClaudeBackend::new(ClaudeConfig::default()).unwrap();
        let request = backend.build_request(&test_agent(""), &json!("hi"));
        // The JSON directive remains even without an operator instruction.
        assert!(request.system.contains("RESPONSE FORMAT"));
    }

    #[test]
    fn parse_policy_is_lenient() {
        let backend = ClaudeBackend::new(ClaudeConfig::default()).unwrap();
        assert_eq!(backend.parse_policy(), ParsePolicy::Lenient);
    }
}
