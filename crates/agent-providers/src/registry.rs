//! Adapter construction and lookup by backend identity.

use agent_core::{AgentError, Backend};
use std::sync::Arc;
use tracing::info;

use crate::anthropic::{ClaudeBackend, ClaudeConfig};
use crate::backend::LlmBackend;
use crate::deepseek::{DeepseekBackend, DeepseekConfig};
use crate::google::{GeminiBackend, GeminiConfig};
use crate::openai::{OpenAiBackend, OpenAiConfig};

/// Per-backend adapter configuration, usually filled from the environment.
#[derive(Debug, Clone, Default)]
pub struct BackendSettings {
    /// OpenAI adapter configuration.
    pub openai: OpenAiConfig,
    /// Claude adapter configuration.
    pub claude: ClaudeConfig,
    /// Gemini adapter configuration.
    pub gemini: GeminiConfig,
    /// Deepseek adapter configuration.
    pub deepseek: DeepseekConfig,
}

impl BackendSettings {
    /// Replace the OpenAI configuration.
    #[must_use]
    pub fn with_openai(mut self, config: OpenAiConfig) -> Self {
        self.openai = config;
        self
    }

    /// Replace the Claude configuration.
    #[must_use]
    pub fn with_claude(mut self, config: ClaudeConfig) -> Self {
        self.claude = config;
        self
    }

    /// Replace the Gemini configuration.
    #[must_use]
    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    /// Replace the Deepseek configuration.
    #[must_use]
    pub fn with_deepseek(mut self, config: DeepseekConfig) -> Self {
        self.deepseek = config;
        self
    }
}

/// Holds one shared adapter instance per implemented backend.
///
/// Adapters are stateless beyond their HTTP client and configuration, so a
/// single instance serves every agent bound to that backend.
pub struct BackendRegistry {
    openai: Arc<dyn LlmBackend>,
    claude: Arc<dyn LlmBackend>,
    gemini: Arc<dyn LlmBackend>,
    deepseek: Arc<dyn LlmBackend>,
}

impl BackendRegistry {
    /// Build all implemented adapters up front.
    pub fn new(settings: BackendSettings) -> Result<Self, AgentError> {
        let registry = Self {
            openai: Arc::new(OpenAiBackend::new(settings.openai)?),
            claude: Arc::new(ClaudeBackend::new(settings.claude)?),
            gemini: Arc::new(GeminiBackend::new(settings.gemini)?),
            deepseek: Arc::new(DeepseekBackend::new(settings.deepseek)?),
        };
        info!("Initialized backend adapters: ChatGPT, Claude, Gemini, Deepseek");
        Ok(registry)
    }

    /// Resolve the adapter for a backend.
    ///
    /// Grok is an accepted configuration value without an adapter yet; asking
    /// for it is a 501, not a panic.
    pub fn get(&self, backend: Backend) -> Result<Arc<dyn LlmBackend>, AgentError> {
        match backend {
            Backend::OpenAi => Ok(Arc::clone(&self.openai)),
            Backend::Claude => Ok(Arc::clone(&self.claude)),
            Backend::Gemini => Ok(Arc::clone(&self.gemini)),
            Backend::Deepseek => Ok(Arc::clone(&self.deepseek)),
            Backend::Grok => Err(AgentError::not_implemented(backend.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_implemented_backend() {
        let registry = BackendRegistry::new(BackendSettings::default()).unwrap();
        for backend in [
            Backend::OpenAi,
            Backend::Claude,
            Backend::Gemini,
            Backend::Deepseek,
        ] {
            let adapter = registry.get(backend).unwrap();
            assert_eq!(adapter.name(), backend.as_str());
        }
    }

    #[test]
    fn grok_is_not_yet_implemented() {
        let registry = BackendRegistry::new(BackendSettings::default()).unwrap();
        let Err(err) = registry.get(Backend::Grok) else {
            panic!("expected an unimplemented-backend error");
        };
        assert_eq!(err.status_code(), 501);
        assert_eq!(err.to_string(), "Grok service is not yet implemented");
    }
}
