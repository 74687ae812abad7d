//! # Agent Store
//!
//! Persistence for agent definitions.
//!
//! The [`AgentStore`] trait is the seam between the HTTP layer and storage;
//! [`SqliteStore`] is the production implementation and [`MemoryStore`] backs
//! tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use agent_core::{AgentConfig, AgentError, AgentUpdate, NewAgent};
use async_trait::async_trait;

/// Storage contract for agent definitions.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// All stored agents.
    async fn find_all(&self) -> Result<Vec<AgentConfig>, AgentError>;

    /// Look up one agent by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<AgentConfig>, AgentError>;

    /// Look up one agent by route path.
    ///
    /// Tries the normalized form of the path first, then the raw form, so
    /// agents stored before path normalization stay reachable.
    async fn find_by_path(&self, path: &str) -> Result<Option<AgentConfig>, AgentError>;

    /// Persist a new agent, assigning its id and timestamps.
    async fn create(&self, agent: NewAgent) -> Result<AgentConfig, AgentError>;

    /// Apply a partial update. Returns `None` when the id is unknown.
    async fn update(&self, id: &str, update: AgentUpdate)
        -> Result<Option<AgentConfig>, AgentError>;

    /// Delete an agent. Returns whether anything was removed.
    async fn delete(&self, id: &str) -> Result<bool, AgentError>;
}

/// Apply a partial update onto an existing agent, bumping `updated_at`.
///
/// Schema fields replace wholesale; `None` in the update leaves the stored
/// schema untouched (clearing a schema is done by replacing it with a text
/// schema, not by omission).
pub(crate) fn apply_update(agent: &mut AgentConfig, update: AgentUpdate) {
    if let Some(name) = update.name {
        agent.name = name;
    }
    if let Some(backend) = update.backend {
        agent.backend = backend;
    }
    if let Some(credential) = update.credential {
        agent.credential = credential;
    }
    if let Some(route_path) = update.route_path {
        agent.route_path = route_path;
    }
    if let Some(instruction) = update.instruction {
        agent.instruction = instruction;
    }
    if let Some(request_schema) = update.request_schema {
        agent.request_schema = Some(request_schema);
    }
    if let Some(response_schema) = update.response_schema {
        agent.response_schema = Some(response_schema);
    }
    agent.updated_at = chrono::Utc::now();
}

/// Build a full [`AgentConfig`] from operator input.
pub(crate) fn materialize(agent: NewAgent) -> AgentConfig {
    let now = chrono::Utc::now();
    AgentConfig {
        id: uuid::Uuid::new_v4().to_string(),
        name: agent.name,
        backend: agent.backend,
        credential: agent.credential,
        route_path: agent.route_path,
        instruction: agent.instruction,
        request_schema: agent.request_schema,
        response_schema: agent.response_schema,
        created_at: now,
        updated_at: now,
    }
}
