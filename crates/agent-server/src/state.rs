//! Shared application state.

use agent_providers::BackendRegistry;
use agent_routing::RouteRegistry;
use agent_store::AgentStore;
use std::sync::Arc;

use crate::executor::Executor;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Agent persistence.
    pub store: Arc<dyn AgentStore>,
    /// Live route table.
    pub routes: Arc<RouteRegistry>,
    /// The execution pipeline.
    pub executor: Arc<Executor>,
}

impl AppState {
    /// Assemble the state graph from its leaves.
    #[must_use]
    pub fn new(store: Arc<dyn AgentStore>, backends: Arc<BackendRegistry>) -> Self {
        let routes = Arc::new(RouteRegistry::new());
        let executor = Arc::new(Executor::new(
            Arc::clone(&store),
            Arc::clone(&routes),
            backends,
        ));
        Self {
            store,
            routes,
            executor,
        }
    }
}
