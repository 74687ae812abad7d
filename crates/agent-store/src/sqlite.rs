//! `SQLite`-backed store, the production default.

use agent_core::{AgentConfig, AgentError, AgentUpdate, Backend, Credential, NewAgent, Schema};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::info;

use crate::{apply_update, materialize, AgentStore};

const CREATE_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS agents (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    backend TEXT NOT NULL,
    credential TEXT NOT NULL,
    route_path TEXT NOT NULL,
    instruction TEXT NOT NULL,
    request_schema TEXT,
    response_schema TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

/// [`AgentStore`] backed by a `SQLite` database file.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to the database and ensure the schema exists.
    ///
    /// `url` is a sqlx connection string such as `sqlite://agents.db?mode=rwc`.
    pub async fn connect(url: &str) -> Result<Self, AgentError> {
        // An in-memory database exists per connection, so it must be pinned
        // to exactly one that never gets reaped.
        let options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = options
            .connect(url)
            .await
            .map_err(|e| AgentError::store(format!("Failed to open database: {e}")))?;

        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(store_err)?;

        info!(url, "Connected to agent database");
        Ok(Self { pool })
    }
}

#[async_trait]
impl AgentStore for SqliteStore {
    async fn find_all(&self) -> Result<Vec<AgentConfig>, AgentError> {
        let rows = sqlx::query("SELECT * FROM agents ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        rows.iter().map(row_to_agent).collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AgentConfig>, AgentError> {
        let row = sqlx::query("SELECT * FROM agents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        row.as_ref().map(row_to_agent).transpose()
    }

    async fn find_by_path(&self, path: &str) -> Result<Option<AgentConfig>, AgentError> {
        let normalized = format!("/{}", path.trim_start_matches('/'));
        let row = sqlx::query(
            "SELECT * FROM agents WHERE route_path = ? OR route_path = ? \
             ORDER BY route_path = ? DESC LIMIT 1",
        )
        .bind(&normalized)
        .bind(path)
        .bind(&normalized)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.as_ref().map(row_to_agent).transpose()
    }

    async fn create(&self, agent: NewAgent) -> Result<AgentConfig, AgentError> {
        let agent = materialize(agent);
        insert_agent(&self.pool, &agent).await?;
        Ok(agent)
    }

    async fn update(
        &self,
        id: &str,
        update: AgentUpdate,
    ) -> Result<Option<AgentConfig>, AgentError> {
        let Some(mut agent) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        apply_update(&mut agent, update);

        sqlx::query(
            "UPDATE agents SET name = ?, backend = ?, credential = ?, route_path = ?, \
             instruction = ?, request_schema = ?, response_schema = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&agent.name)
        .bind(agent.backend.as_str())
        .bind(agent.credential.expose())
        .bind(&agent.route_path)
        .bind(&agent.instruction)
        .bind(schema_to_column(agent.request_schema.as_ref())?)
        .bind(schema_to_column(agent.response_schema.as_ref())?)
        .bind(agent.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(Some(agent))
    }

    async fn delete(&self, id: &str) -> Result<bool, AgentError> {
        let result = sqlx::query("DELETE FROM agents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected() > 0)
    }
}

async fn insert_agent(pool: &SqlitePool, agent: &AgentConfig) -> Result<(), AgentError> {
    sqlx::query(
        "INSERT INTO agents (id, name, backend, credential, route_path, instruction, \
         request_schema, response_schema, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&agent.id)
    .bind(&agent.name)
    .bind(agent.backend.as_str())
    .bind(agent.credential.expose())
    .bind(&agent.route_path)
    .bind(&agent.instruction)
    .bind(schema_to_column(agent.request_schema.as_ref())?)
    .bind(schema_to_column(agent.response_schema.as_ref())?)
    .bind(agent.created_at)
    .bind(agent.updated_at)
    .execute(pool)
    .await
    .map_err(store_err)?;
    Ok(())
}

fn row_to_agent(row: &SqliteRow) -> Result<AgentConfig, AgentError> {
    let backend_literal: String = row.try_get("backend").map_err(store_err)?;
    // An unknown literal means the row was written by a newer deployment;
    // surface a typed error instead of poisoning the whole listing.
    let backend: Backend = backend_literal.parse()?;

    let credential: String = row.try_get("credential").map_err(store_err)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(store_err)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(store_err)?;

    Ok(AgentConfig {
        id: row.try_get("id").map_err(store_err)?,
        name: row.try_get("name").map_err(store_err)?,
        backend,
        credential: Credential::new(credential),
        route_path: row.try_get("route_path").map_err(store_err)?,
        instruction: row.try_get("instruction").map_err(store_err)?,
        request_schema: schema_from_column(row.try_get("request_schema").map_err(store_err)?)?,
        response_schema: schema_from_column(row.try_get("response_schema").map_err(store_err)?)?,
        created_at,
        updated_at,
    })
}

fn schema_to_column(schema: Option<&Schema>) -> Result<Option<String>, AgentError> {
    schema
        .map(|s| serde_json::to_string(s).map_err(|e| AgentError::store(e.to_string())))
        .transpose()
}

fn schema_from_column(column: Option<String>) -> Result<Option<Schema>, AgentError> {
    column
        .map(|text| {
            serde_json::from_str(&text)
                .map_err(|e| AgentError::store(format!("Corrupt stored schema: {e}")))
        })
        .transpose()
}

fn store_err(error: sqlx::Error) -> AgentError {
    AgentError::store(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{FieldSpec, FieldType};

    fn new_agent(name: &str, route_path: &str) -> NewAgent {
        NewAgent {
            name: name.to_string(),
            backend: Backend::Claude,
            credential: Credential::new("sk-ant-key"),
            route_path: route_path.to_string(),
            instruction: "be helpful".to_string(),
            request_schema: Some(Schema::json(vec![FieldSpec::new(
                "topic",
                FieldType::String,
                true,
            )])),
            response_schema: Some(Schema::text()),
        }
    }

    async fn test_store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn round_trips_an_agent_through_sqlite() {
        let store = test_store().await;
        let created = store.create(new_agent("helper", "/api/helper")).await.unwrap();

        let fetched = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "helper");
        assert_eq!(fetched.backend, Backend::Claude);
        assert_eq!(fetched.credential.expose(), "sk-ant-key");
        assert!(fetched.request_schema.is_some());
    }

    #[tokio::test]
    async fn find_by_path_prefers_the_normalized_form() {
        let store = test_store().await;
        store.create(new_agent("a", "/api/helper")).await.unwrap();

        assert!(store.find_by_path("api/helper").await.unwrap().is_some());
        assert!(store.find_by_path("/api/helper").await.unwrap().is_some());
        assert!(store.find_by_path("/api/other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_persists_changed_fields() {
        let store = test_store().await;
        let created = store.create(new_agent("a", "/api/a")).await.unwrap();

        store
            .update(
                &created.id,
                AgentUpdate {
                    route_path: Some("/api/renamed".to_string()),
                    ..AgentUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        let fetched = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.route_path, "/api/renamed");
        assert!(fetched.updated_at >= fetched.created_at);
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let store = test_store().await;
        let created = store.create(new_agent("a", "/api/a")).await.unwrap();

        assert!(store.delete(&created.id).await.unwrap());
        assert!(!store.delete(&created.id).await.unwrap());
        assert!(store.find_by_id(&created.id).await.unwrap().is_none());
    }
}
