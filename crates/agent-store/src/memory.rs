//! In-memory store used by tests and ephemeral deployments.

use agent_core::{AgentConfig, AgentError, AgentUpdate, NewAgent};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::{apply_update, materialize, AgentStore};

/// A `HashMap`-backed [`AgentStore`]. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    agents: RwLock<HashMap<String, AgentConfig>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<AgentConfig>, AgentError> {
        let mut agents: Vec<AgentConfig> = self.agents.read().values().cloned().collect();
        agents.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(agents)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AgentConfig>, AgentError> {
        Ok(self.agents.read().get(id).cloned())
    }

    async fn find_by_path(&self, path: &str) -> Result<Option<AgentConfig>, AgentError> {
        let normalized = format!("/{}", path.trim_start_matches('/'));
        let agents = self.agents.read();
        let found = agents
            .values()
            .find(|agent| agent.route_path == normalized)
            .or_else(|| agents.values().find(|agent| agent.route_path == path));
        Ok(found.cloned())
    }

    async fn create(&self, agent: NewAgent) -> Result<AgentConfig, AgentError> {
        let agent = materialize(agent);
        self.agents
            .write()
            .insert(agent.id.clone(), agent.clone());
        Ok(agent)
    }

    async fn update(
        &self,
        id: &str,
        update: AgentUpdate,
    ) -> Result<Option<AgentConfig>, AgentError> {
        let mut agents = self.agents.write();
        match agents.get_mut(id) {
            Some(agent) => {
                apply_update(agent, update);
                Ok(Some(agent.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, AgentError> {
        Ok(self.agents.write().remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{Backend, Credential};

    fn new_agent(name: &str, route_path: &str) -> NewAgent {
        NewAgent {
            name: name.to_string(),
            backend: Backend::OpenAi,
            credential: Credential::new("key"),
            route_path: route_path.to_string(),
            instruction: "test instruction".to_string(),
            request_schema: None,
            response_schema: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_timestamps() {
        let store = MemoryStore::new();
        let agent = store.create(new_agent("a", "/api/a")).await.unwrap();

        assert!(!agent.id.is_empty());
        assert_eq!(agent.created_at, agent.updated_at);
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn find_by_path_normalizes_before_matching() {
        let store = MemoryStore::new();
        store.create(new_agent("a", "/api/a")).await.unwrap();

        assert!(store.find_by_path("api/a").await.unwrap().is_some());
        assert!(store.find_by_path("/api/a").await.unwrap().is_some());
        assert!(store.find_by_path("/api/b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_applies_only_provided_fields() {
        let store = MemoryStore::new();
        let agent = store.create(new_agent("a", "/api/a")).await.unwrap();

        let updated = store
            .update(
                &agent.id,
                AgentUpdate {
                    instruction: Some("revised".to_string()),
                    ..AgentUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.instruction, "revised");
        assert_eq!(updated.name, "a");
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_ids() {
        let store = MemoryStore::new();
        assert!(store
            .update("nope", AgentUpdate::default())
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete("nope").await.unwrap());
    }
}
