//! HTTP request handlers.

use agent_core::{AgentConfig, AgentUpdate, NewAgent};
use agent_routing::normalize_path;
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::extractors::AgentBody;
use crate::state::AppState;

/// Health check endpoint.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// `GET /api/agents`
pub async fn list_agents(State(state): State<AppState>) -> Result<Response, ApiError> {
    let agents = state.store.find_all().await?;
    Ok(success(json!({ "agents": agents })).into_response())
}

/// `GET /api/agents/:id`
pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let agent = state
        .store
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Agent with ID {id} not found")))?;
    Ok(success(json!({ "agent": agent })).into_response())
}

/// `POST /api/agents`
pub async fn create_agent(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let new_agent: NewAgent = serde_json::from_value(body)
        .map_err(|_| ApiError::bad_request("Missing required agent fields"))?;

    validate_new_agent(&new_agent)?;
    ensure_path_available(&state, &new_agent.route_path, None).await?;

    let agent = state.store.create(new_agent).await?;
    info!(agent_id = %agent.id, path = %agent.route_path, "Created agent");

    refresh_routes(&state).await;
    Ok((StatusCode::CREATED, success(json!({ "agent": agent }))).into_response())
}

/// `PUT /api/agents/:id`
pub async fn update_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let update: AgentUpdate = serde_json::from_value(body)
        .map_err(|_| ApiError::bad_request("Invalid agent update payload"))?;

    if let Some(schema) = update.request_schema.as_ref() {
        schema.validate()?;
    }
    if let Some(schema) = update.response_schema.as_ref() {
        schema.validate()?;
    }
    if let Some(path) = update.route_path.as_deref() {
        ensure_path_available(&state, path, Some(&id)).await?;
    }

    let agent = state
        .store
        .update(&id, update)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Agent with ID {id} not found")))?;
    info!(agent_id = %agent.id, "Updated agent");

    refresh_routes(&state).await;
    Ok(success(json!({ "agent": agent })).into_response())
}

/// `DELETE /api/agents/:id`
pub async fn delete_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let deleted = state.store.delete(&id).await?;
    if !deleted {
        return Err(ApiError::not_found(format!("Agent with ID {id} not found")));
    }
    info!(agent_id = %id, "Deleted agent");

    refresh_routes(&state).await;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `POST /api/agents/:id/execute`
pub async fn execute_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AgentBody(input): AgentBody,
) -> Result<Response, ApiError> {
    let result = state.executor.execute_by_id(&id, input).await?;
    Ok(Json(result).into_response())
}

/// Fallback handler serving the operator-defined dynamic routes.
///
/// Anything that did not match a fixed route lands here; only POST requests
/// to a registered agent path produce a response.
pub async fn dynamic_route(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_string();

    // The method check comes before body extraction so a stray GET gets a
    // clean 404 instead of a body complaint.
    if request.method() != Method::POST {
        return Err(ApiError::not_found(format!("No agent found for path {path}")));
    }

    let AgentBody(input) = AgentBody::from_request(request, &()).await?;
    let result = state.executor.execute_by_path(&path, input).await?;
    Ok(Json(result).into_response())
}

/// Wrap a payload in the `{status: "success", data}` envelope.
fn success(data: Value) -> Json<Value> {
    Json(json!({
        "status": "success",
        "data": data,
    }))
}

fn validate_new_agent(agent: &NewAgent) -> Result<(), ApiError> {
    if agent.name.is_empty() || agent.route_path.is_empty() || agent.instruction.is_empty() {
        return Err(ApiError::bad_request("Missing required agent fields"));
    }
    if let Some(schema) = agent.request_schema.as_ref() {
        schema.validate()?;
    }
    if let Some(schema) = agent.response_schema.as_ref() {
        schema.validate()?;
    }
    Ok(())
}

/// Reject a route path already held by a different agent.
async fn ensure_path_available(
    state: &AppState,
    path: &str,
    exclude_id: Option<&str>,
) -> Result<(), ApiError> {
    let normalized = normalize_path(path);
    let holder = state
        .store
        .find_all()
        .await?
        .into_iter()
        .find(|agent: &AgentConfig| normalize_path(&agent.route_path) == normalized);

    if let Some(holder) = holder {
        if exclude_id != Some(holder.id.as_str()) {
            warn!(path = %normalized, holder_id = %holder.id, "Route path already in use");
            return Err(ApiError::bad_request(format!(
                "Route path {normalized} is already in use"
            )));
        }
    }
    Ok(())
}

/// Rebuild the route table from the store.
///
/// A store failure here leaves the previous table in place; the mutation that
/// triggered the refresh has already been persisted, so it is logged rather
/// than turned into a request failure.
async fn refresh_routes(state: &AppState) {
    match state.store.find_all().await {
        Ok(agents) => {
            state.routes.rebuild(agents);
        }
        Err(err) => {
            error!(error = %err, "Failed to refresh route table after agent mutation");
        }
    }
}

/// Rebuild the route table at startup, surfacing store failures.
pub async fn initial_route_build(state: &AppState) -> Result<(), agent_core::AgentError> {
    let agents = state.store.find_all().await?;
    let summary = state.routes.rebuild(agents);
    info!(routes = summary.registered, "Initial route table built");
    Ok(())
}
