//! The agent configuration model.
//!
//! An agent binds a route path to a backend, a credential, a behavior
//! instruction, and optional request/response schemas. The gateway only ever
//! reads immutable snapshots of these records; all mutation goes through the
//! configuration store.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

use crate::error::AgentError;

/// Identifier for a language-model backend.
///
/// The wire literals match the stored configuration values. `Grok` is
/// declared but has no adapter yet; dispatching to it yields a 501.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// OpenAI chat completions.
    #[serde(rename = "ChatGPT")]
    OpenAi,
    /// Anthropic messages API.
    Claude,
    /// Google Gemini generateContent API.
    Gemini,
    /// Deepseek chat completions.
    Deepseek,
    /// Declared but unimplemented.
    Grok,
}

impl Backend {
    /// The configured literal for this backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "ChatGPT",
            Self::Claude => "Claude",
            Self::Gemini => "Gemini",
            Self::Deepseek => "Deepseek",
            Self::Grok => "Grok",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Backend {
    type Err = crate::AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ChatGPT" => Ok(Self::OpenAi),
            "Claude" => Ok(Self::Claude),
            "Gemini" => Ok(Self::Gemini),
            "Deepseek" => Ok(Self::Deepseek),
            "Grok" => Ok(Self::Grok),
            other => Err(crate::AgentError::configuration(format!(
                "Unknown backend: {other}"
            ))),
        }
    }
}

/// An opaque provider credential.
///
/// The value is redacted from `Debug` and `Display` output so it can never
/// land in logs in full; adapters read it through [`Credential::expose`].
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Wrap a raw credential string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::new(value.into()))
    }

    /// Access the raw credential for an outbound provider call.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl From<&str> for Credential {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// Serialization exposes the value: the store and the admin API both need the
// full credential to round-trip agent records.
impl Serialize for Credential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Payload shape of a schema: structured JSON or plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// Structured JSON, optionally with typed fields.
    Json,
    /// Plain text.
    Text,
}

/// Runtime type a schema field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// JSON string.
    String,
    /// JSON number.
    Number,
    /// JSON boolean.
    Boolean,
    /// JSON object.
    Object,
    /// JSON array.
    Array,
}

impl FieldType {
    /// Lowercase name used in validation messages and prompt directives.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single declared field in a JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name, unique within its containing list.
    pub name: String,
    /// Declared runtime type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the field must be present.
    #[serde(default)]
    pub required: bool,
    /// Documentation only; forwarded into the prompt directive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Nested object shape, configuration-UI only. Not enforced by the
    /// validation engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
    /// Array item shape, configuration-UI only. Not enforced by the
    /// validation engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<serde_json::Value>,
}

impl FieldSpec {
    /// Create a field spec with the given name and type.
    pub fn new(name: impl Into<String>, field_type: FieldType, required: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            required,
            description: None,
            properties: None,
            items: None,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Declarative description of an accepted or produced payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Payload shape.
    #[serde(rename = "type")]
    pub kind: SchemaKind,
    /// Typed fields, only meaningful when `kind` is `json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldSpec>>,
    /// Documentation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Schema {
    /// A plain-text schema.
    pub fn text() -> Self {
        Self {
            kind: SchemaKind::Text,
            fields: None,
            description: None,
        }
    }

    /// A JSON schema with the given fields.
    pub fn json(fields: Vec<FieldSpec>) -> Self {
        Self {
            kind: SchemaKind::Json,
            fields: Some(fields),
            description: None,
        }
    }

    /// Declared fields, or an empty slice.
    pub fn fields(&self) -> &[FieldSpec] {
        self.fields.as_deref().unwrap_or_default()
    }

    /// Check the structural invariants: a text schema carries no fields and
    /// field names are unique within the list.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.kind == SchemaKind::Text && !self.fields().is_empty() {
            return Err(AgentError::configuration(
                "A text schema must not declare fields",
            ));
        }

        let mut seen = HashSet::new();
        for field in self.fields() {
            if !seen.insert(field.name.as_str()) {
                return Err(AgentError::configuration(format!(
                    "Duplicate schema field name: {}",
                    field.name
                )));
            }
        }

        Ok(())
    }
}

/// A configured agent: the binding of a route path to a backend, credential,
/// instruction, and optional schemas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    /// Opaque unique identifier.
    pub id: String,
    /// Operator-facing name.
    pub name: String,
    /// Which provider executes this agent.
    pub backend: Backend,
    /// Provider credential, forwarded opaquely per call.
    pub credential: Credential,
    /// Absolute path this agent is reachable under.
    pub route_path: String,
    /// Free-text behavior directive sent as the system-level instruction.
    pub instruction: String,
    /// Expected request shape, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<Schema>,
    /// Expected response shape, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Schema>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a new agent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAgent {
    /// Operator-facing name.
    pub name: String,
    /// Backend identifier.
    pub backend: Backend,
    /// Provider credential.
    pub credential: Credential,
    /// Route path the agent should answer under.
    pub route_path: String,
    /// Behavior directive.
    pub instruction: String,
    /// Expected request shape.
    #[serde(default)]
    pub request_schema: Option<Schema>,
    /// Expected response shape.
    #[serde(default)]
    pub response_schema: Option<Schema>,
}

/// Partial update for an existing agent; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentUpdate {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New backend.
    #[serde(default)]
    pub backend: Option<Backend>,
    /// New credential.
    #[serde(default)]
    pub credential: Option<Credential>,
    /// New route path.
    #[serde(default)]
    pub route_path: Option<String>,
    /// New instruction.
    #[serde(default)]
    pub instruction: Option<String>,
    /// New request schema (replaces the old one entirely).
    #[serde(default)]
    pub request_schema: Option<Schema>,
    /// New response schema (replaces the old one entirely).
    #[serde(default)]
    pub response_schema: Option<Schema>,
}
