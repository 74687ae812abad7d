//! # Agent Routing
//!
//! The dynamic route table mapping operator-chosen URL paths to agents.
//!
//! Routes change whenever an agent is created, updated, or deleted, so the
//! table is kept behind an [`arc_swap::ArcSwap`]: rebuilds assemble a fresh
//! snapshot off to the side and publish it with one atomic pointer store.
//! In-flight lookups keep reading the old snapshot; there is no lock on the
//! request path.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use agent_core::AgentConfig;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Normalize an operator-supplied route path to have exactly one leading slash.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    format!("/{trimmed}")
}

/// Outcome summary of one route-table rebuild.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RebuildSummary {
    /// Number of routes in the published table.
    pub registered: usize,
    /// Agents skipped because their path was empty.
    pub skipped_empty: usize,
    /// Agents skipped because another agent already held their path.
    pub skipped_conflicts: usize,
}

/// One immutable route-table snapshot.
#[derive(Debug, Default)]
struct RouteTable {
    routes: HashMap<String, AgentConfig>,
}

impl RouteTable {
    /// Look up an agent by request path.
    ///
    /// Keys are normalized at insert, so normalizing the incoming path makes
    /// `api/chat` and `/api/chat` resolve to the same agent.
    fn lookup(&self, path: &str) -> Option<&AgentConfig> {
        self.routes.get(&normalize_path(path))
    }
}

/// The live route registry.
///
/// Shared across the server; `rebuild` is called after every agent mutation
/// and at startup, `lookup` on every dynamic request.
#[derive(Default)]
pub struct RouteRegistry {
    table: ArcSwap<RouteTable>,
}

impl RouteRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the table from the full agent set and publish it atomically.
    ///
    /// Agents without a route path are skipped. When two agents normalize to
    /// the same path the first one registered wins and the loser is skipped
    /// with an error log; an existing working route is never silently
    /// shadowed by a later registration.
    pub fn rebuild(&self, agents: Vec<AgentConfig>) -> RebuildSummary {
        let mut routes: HashMap<String, AgentConfig> = HashMap::with_capacity(agents.len());
        let mut summary = RebuildSummary::default();

        for agent in agents {
            if agent.route_path.is_empty() {
                debug!(agent_id = %agent.id, "Skipping agent without a route path");
                summary.skipped_empty += 1;
                continue;
            }

            let path = normalize_path(&agent.route_path);
            if let Some(holder) = routes.get(&path) {
                error!(
                    path = %path,
                    holder_id = %holder.id,
                    agent_id = %agent.id,
                    "Route path conflict, keeping the first registration"
                );
                summary.skipped_conflicts += 1;
                continue;
            }

            debug!(path = %path, agent_id = %agent.id, "Registered agent route");
            routes.insert(path, agent);
        }

        summary.registered = routes.len();
        self.table.store(Arc::new(RouteTable { routes }));
        info!(
            routes = summary.registered,
            conflicts = summary.skipped_conflicts,
            "Published route table"
        );
        summary
    }

    /// Resolve the agent bound to a request path, if any.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<AgentConfig> {
        self.table.load().lookup(path).cloned()
    }

    /// Number of live routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.load().routes.len()
    }

    /// Whether the table has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The currently registered paths, unordered.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.table.load().routes.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{Backend, Credential};
    use chrono::Utc;

    fn agent(id: &str, route_path: &str) -> AgentConfig {
        AgentConfig {
            id: id.to_string(),
            name: format!("agent-{id}"),
            backend: Backend::OpenAi,
            credential: Credential::new("key"),
            route_path: route_path.to_string(),
            instruction: "do things".to_string(),
            request_schema: None,
            response_schema: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn normalizes_to_one_leading_slash() {
        assert_eq!(normalize_path("api/chat"), "/api/chat");
        assert_eq!(normalize_path("/api/chat"), "/api/chat");
        assert_eq!(normalize_path("//api/chat"), "/api/chat");
    }

    #[test]
    fn lookup_finds_agents_regardless_of_stored_slash() {
        let registry = RouteRegistry::new();
        registry.rebuild(vec![agent("a", "api/one"), agent("b", "/api/two")]);

        assert_eq!(registry.lookup("/api/one").unwrap().id, "a");
        assert_eq!(registry.lookup("api/one").unwrap().id, "a");
        assert_eq!(registry.lookup("/api/two").unwrap().id, "b");
        assert!(registry.lookup("/api/three").is_none());
    }

    #[test]
    fn first_registration_wins_on_conflict() {
        let registry = RouteRegistry::new();
        let summary = registry.rebuild(vec![agent("first", "/api/chat"), agent("second", "api/chat")]);

        assert_eq!(summary.registered, 1);
        assert_eq!(summary.skipped_conflicts, 1);
        assert_eq!(registry.lookup("/api/chat").unwrap().id, "first");
    }

    #[test]
    fn agents_without_paths_are_skipped() {
        let registry = RouteRegistry::new();
        let summary = registry.rebuild(vec![agent("a", ""), agent("b", "/api/b")]);

        assert_eq!(summary.registered, 1);
        assert_eq!(summary.skipped_empty, 1);
    }

    #[test]
    fn rebuild_is_idempotent_for_an_unchanged_snapshot() {
        let registry = RouteRegistry::new();
        let agents = vec![agent("a", "/api/a"), agent("b", "api/b"), agent("c", "")];

        let first = registry.rebuild(agents.clone());
        let mut paths_before = registry.paths();
        paths_before.sort();

        let second = registry.rebuild(agents);
        let mut paths_after = registry.paths();
        paths_after.sort();

        assert_eq!(first, second);
        assert_eq!(paths_before, paths_after);
        assert_eq!(registry.lookup("/api/a").unwrap().id, "a");
        assert_eq!(registry.lookup("/api/b").unwrap().id, "b");
    }

    #[test]
    fn rebuild_replaces_the_previous_table() {
        let registry = RouteRegistry::new();
        registry.rebuild(vec![agent("a", "/api/a")]);
        registry.rebuild(vec![agent("b", "/api/b")]);

        assert!(registry.lookup("/api/a").is_none());
        assert_eq!(registry.lookup("/api/b").unwrap().id, "b");
        assert_eq!(registry.len(), 1);
    }
}
