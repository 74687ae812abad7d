//! Route definitions for the gateway API.

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::{handlers, state::AppState};

/// Create the main API router.
///
/// Fixed routes come first; everything else falls through to the dynamic
/// agent-route handler.
pub fn create_router(state: AppState, cors_origin: Option<String>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/agents", agent_routes())
        .fallback(handlers::dynamic_route)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

/// Agent management and execution routes.
fn agent_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_agents).post(handlers::create_agent))
        .route(
            "/:id",
            get(handlers::get_agent)
                .put(handlers::update_agent)
                .delete(handlers::delete_agent),
        )
        .route("/:id/execute", post(handlers::execute_agent))
}

fn cors_layer(origin: Option<String>) -> CorsLayer {
    match origin {
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => CorsLayer::new()
                .allow_origin(value)
                .allow_methods(Any)
                .allow_headers(Any),
            Err(_) => {
                warn!(origin, "Invalid CORS_ORIGIN value, allowing any origin");
                CorsLayer::permissive()
            }
        },
        None => CorsLayer::permissive(),
    }
}
