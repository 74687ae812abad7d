//! The agent execution pipeline.
//!
//! One path for every entry point: resolve the agent, validate the input
//! against its request schema, dispatch to the backend adapter, validate the
//! reply against its response schema.

use agent_core::{AgentConfig, AgentError};
use agent_providers::BackendRegistry;
use agent_routing::RouteRegistry;
use agent_store::AgentStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

/// Runs agents end to end.
pub struct Executor {
    store: Arc<dyn AgentStore>,
    routes: Arc<RouteRegistry>,
    backends: Arc<BackendRegistry>,
}

impl Executor {
    /// Wire the executor to its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn AgentStore>,
        routes: Arc<RouteRegistry>,
        backends: Arc<BackendRegistry>,
    ) -> Self {
        Self {
            store,
            routes,
            backends,
        }
    }

    /// Execute the agent with the given id.
    pub async fn execute_by_id(&self, id: &str, input: Value) -> Result<Value, AgentError> {
        let agent = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AgentError::not_found(format!("Agent with ID {id} not found")))?;
        self.execute_for(&agent, input).await
    }

    /// Execute the agent bound to the given route path.
    ///
    /// Resolution goes through the route table snapshot, not the store, so a
    /// route that lost a path conflict stays unreachable here.
    pub async fn execute_by_path(&self, path: &str, input: Value) -> Result<Value, AgentError> {
        let agent = self
            .routes
            .lookup(path)
            .ok_or_else(|| AgentError::not_found(format!("No agent found for path {path}")))?;
        self.execute_for(&agent, input).await
    }

    /// The shared pipeline body.
    pub async fn execute_for(&self, agent: &AgentConfig, input: Value) -> Result<Value, AgentError> {
        let input = agent_schema::validate_request(input, agent.request_schema.as_ref())?;

        let backend = self.backends.get(agent.backend)?;

        info!(
            agent_id = %agent.id,
            agent = %agent.name,
            backend = backend.name(),
            "Executing agent"
        );

        let reply = backend.execute(agent, &input).await.map_err(|err| {
            error!(
                agent_id = %agent.id,
                backend = backend.name(),
                error = %err,
                "Agent execution failed"
            );
            err
        })?;

        agent_schema::validate_response(reply, agent.response_schema.as_ref())
    }
}
