//! Google Gemini generateContent adapter.
//!
//! Auth: API key passed as a `key` query-string parameter. The system-level
//! instruction travels as a leading user turn. Text lives at
//! `candidates[0].content.parts[0].text`. Parse policy: strict.

use agent_core::{AgentConfig, AgentError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::backend::{decode_json_reply, provider_error, transport_error, LlmBackend, ParsePolicy};
use crate::prompt;

const BACKEND_NAME: &str = "Gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_ERROR: &str = "Failed to execute Gemini prompt";

/// Gemini adapter configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API base URL.
    pub base_url: String,
    /// Model identifier baked into the endpoint path.
    pub model: String,
    /// Outbound request timeout.
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl GeminiConfig {
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

/// Gemini backend adapter.
pub struct GeminiBackend {
    config: GeminiConfig,
    client: Client,
}

impl GeminiBackend {
    /// Create the adapter with its own HTTP client.
    pub fn new(config: GeminiConfig) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    fn build_request(&self, agent: &AgentConfig, input: &Value) -> GeminiRequest {
        let mut contents = Vec::new();

        // Gemini has no dedicated system role here; the instruction rides as
        // a leading user turn.
        if !agent.instruction.is_empty() {
            contents.push(GeminiContent {
                role: "user",
                parts: vec![GeminiPart {
                    text: prompt::compose_system_prompt(agent),
                }],
            });
        }

        contents.push(GeminiContent {
            role: "user",
            parts: vec![GeminiPart {
                text: prompt::render_input(input),
            }],
        });

        GeminiRequest {
            contents,
            generation_config: GeminiGenerationConfig {
                temperature: 0.7,
                top_p: 0.95,
                top_k: 40,
                max_output_tokens: 8192,
            },
        }
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn parse_policy(&self) -> ParsePolicy {
        ParsePolicy::Strict
    }

    async fn execute(&self, agent: &AgentConfig, input: &Value) -> Result<Value, AgentError> {
        let url = self.endpoint_url();
        let request = self.build_request(agent, input);

        debug!(
            backend = BACKEND_NAME,
            agent = %agent.name,
            model = %self.config.model,
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", agent.credential.expose())])
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

        let reply: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            AgentError::provider(BACKEND_NAME, format!("Invalid response JSON: {e}"), None)
        })?;

        let raw = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .unwrap_or_default();

        if prompt::response_wants_json(agent) {
            decode_json_reply(BACKEND_NAME, &raw, self.parse_policy())
        } else {
            Ok(Value::String(raw))
        }
    }
}

// Gemini wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiReplyContent,
}

#[derive(Debug, Deserialize)]
struct GeminiReplyContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}
