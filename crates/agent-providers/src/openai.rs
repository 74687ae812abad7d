//! OpenAI chat-completions adapter (`ChatGPT` backend).
//!
//! Auth: `Authorization: Bearer <credential>`. Text lives at
//! `choices[0].message.content`. Parse policy: lenient.

use agent_core::{AgentConfig, AgentError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::backend::{decode_json_reply, provider_error, transport_error, LlmBackend, ParsePolicy};
use crate::prompt;

const BACKEND_NAME: &str = "ChatGPT";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_ERROR: &str = "Failed to execute ChatGPT prompt";

/// OpenAI adapter configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API base URL.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Outbound request timeout.
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl OpenAiConfig {
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

/// OpenAI backend adapter.
pub struct OpenAiBackend {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiBackend {
    /// Create the adapter with its own HTTP client.
    pub fn new(config: OpenAiConfig) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn build_request(&self, agent: &AgentConfig, input: &Value) -> ChatRequest {
        let mut messages = Vec::new();

        if !agent.instruction.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: prompt::compose_system_prompt(agent),
            });
        }

        messages.push(ChatMessage {
            role: "user",
            content: prompt::render_input(input),
        });

        ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: 0.7,
            max_tokens: 4096,
            top_p: 0.95,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn parse_policy(&self) -> ParsePolicy {
        ParsePolicy::Lenient
    }

    async fn execute(&self, agent: &AgentConfig, input: &Value) -> Result<Value, AgentError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = self.build_request(agent, input);

        debug!(
            backend = BACKEND_NAME,
            agent = %agent.name,
            model = %self.config.model,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(agent.credential.expose())
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

        let reply: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            AgentError::provider(BACKEND_NAME, format!("Invalid response JSON: {e}"), None)
        })?;

        let raw = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if prompt::response_wants_json(agent) {
            decode_json_reply(BACKEND_NAME, &raw, self.parse_policy())
        } else {
            Ok(Value::String(raw))
        }
    }
}

// OpenAI wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
    frequency_penalty: f64,
    presence_penalty: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}
