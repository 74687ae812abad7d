//! Environment-driven application configuration.

use agent_core::AgentError;
use agent_providers::{
    BackendSettings, ClaudeConfig, DeepseekConfig, GeminiConfig, OpenAiConfig,
};
use std::env;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_URL: &str = "sqlite://agents.db?mode=rwc";

/// Application configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// sqlx connection string for the agent database.
    pub database_url: String,
    /// Allowed CORS origin, if restricted.
    pub cors_origin: Option<String>,
    /// Per-backend adapter settings.
    pub backends: BackendSettings,
}

impl AppConfig {
    /// Read configuration from the environment, applying defaults.
    pub fn from_env() -> Result<Self, AgentError> {
        let host = env_or("HOST", DEFAULT_HOST);
        let host: IpAddr = host
            .parse()
            .map_err(|_| AgentError::configuration(format!("Invalid HOST value: {host}")))?;

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| AgentError::configuration(format!("Invalid PORT value: {raw}")))?,
            Err(_) => DEFAULT_PORT,
        };

        let mut backends = BackendSettings::default();
        if let Ok(model) = env::var("DEFAULT_OPENAI_MODEL") {
            backends = backends.with_openai(OpenAiConfig::default().with_model(model));
        }
        if let Ok(model) = env::var("DEFAULT_CLAUDE_MODEL") {
            backends = backends.with_claude(ClaudeConfig::default().with_model(model));
        }
        if let Ok(model) = env::var("DEFAULT_GEMINI_MODEL") {
            backends = backends.with_gemini(GeminiConfig::default().with_model(model));
        }
        if let Ok(model) = env::var("DEFAULT_DEEPSEEK_MODEL") {
            backends = backends.with_deepseek(DeepseekConfig::default().with_model(model));
        }

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            database_url: env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty()),
            backends,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
