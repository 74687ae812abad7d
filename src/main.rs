//! # LLM Agent Gateway
//!
//! Operator-configured HTTP gateway exposing LLM-backed agents.
//!
//! ## Features
//!
//! - Agents bound to operator-chosen URL paths
//! - Multi-backend dispatch (ChatGPT, Claude, Gemini, Deepseek)
//! - Declarative request and response schema validation
//! - SQLite-backed agent persistence with live route rebuilds
//!
//! ## Usage
//!
//! ```bash
//! # Start with default configuration
//! llm-agent-gateway
//!
//! # Start with environment overrides
//! PORT=9000 DATABASE_URL=sqlite://data/agents.db?mode=rwc llm-agent-gateway
//! ```

use agent_providers::BackendRegistry;
use agent_server::handlers::initial_route_build;
use agent_server::{create_router, logging, AppConfig, AppState, Server};
use agent_store::SqliteStore;
use std::sync::Arc;
use tracing::{error, info};

/// Application entry point
#[tokio::main]
async fn main() {
    logging::init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting LLM Agent Gateway"
    );

    if let Err(e) = run().await {
        error!(error = %e, "Application failed");
        std::process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    info!(
        addr = %config.bind_addr,
        database = %config.database_url,
        "Configuration loaded"
    );

    let store = Arc::new(SqliteStore::connect(&config.database_url).await?);
    let backends = Arc::new(BackendRegistry::new(config.backends.clone())?);

    let state = AppState::new(store, backends);
    initial_route_build(&state).await?;

    let router = create_router(state, config.cors_origin.clone());
    let server = Server::new(config.bind_addr, router);

    server.run().await?;
    Ok(())
}
