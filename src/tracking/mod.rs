//! Request tracking collaborator
//!
//! Fire-and-forget side channel: the orchestrator reports status, step, and
//! error updates here, and callers swallow failures. Ships an in-memory
//! backend for development and a Postgres backend selected via DATABASE_URL.

use crate::error::OrchestratorError;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedError {
    pub code: String,
    pub message: String,
    pub severity: String,
    pub step: Option<String>,
    pub recoverable: bool,
}

/// Side-channel tracking sink. Not part of the engine's correctness: callers
/// log and drop any error coming back from these.
#[async_trait]
pub trait TrackingSink: Send + Sync {
    async fn update_status(&self, request_id: Uuid, status: &str) -> Result<()>;
    async fn update_step(&self, request_id: Uuid, step: &str, step_status: &str) -> Result<()>;
    async fn set_results(&self, request_id: Uuid, result: serde_json::Value) -> Result<()>;
    async fn add_error(&self, request_id: Uuid, error: TrackedError) -> Result<()>;
}

//
// ================= In-Memory Backend =================
//

#[derive(Default)]
pub struct InMemoryTracker {
    statuses: RwLock<HashMap<Uuid, String>>,
    steps: RwLock<HashMap<Uuid, Vec<(String, String)>>>,
    results: RwLock<HashMap<Uuid, serde_json::Value>>,
    errors: RwLock<HashMap<Uuid, Vec<TrackedError>>>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn status(&self, request_id: Uuid) -> Option<String> {
        let statuses = self.statuses.read().await;
        statuses.get(&request_id).cloned()
    }

    pub async fn steps(&self, request_id: Uuid) -> Vec<(String, String)> {
        let steps = self.steps.read().await;
        steps.get(&request_id).cloned().unwrap_or_default()
    }

    pub async fn result(&self, request_id: Uuid) -> Option<serde_json::Value> {
        let results = self.results.read().await;
        results.get(&request_id).cloned()
    }

    pub async fn errors(&self, request_id: Uuid) -> Vec<TrackedError> {
        let errors = self.errors.read().await;
        errors.get(&request_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl TrackingSink for InMemoryTracker {
    async fn update_status(&self, request_id: Uuid, status: &str) -> Result<()> {
        let mut statuses = self.statuses.write().await;
        statuses.insert(request_id, status.to_string());
        Ok(())
    }

    async fn update_step(&self, request_id: Uuid, step: &str, step_status: &str) -> Result<()> {
        let mut steps = self.steps.write().await;
        steps
            .entry(request_id)
            .or_default()
            .push((step.to_string(), step_status.to_string()));
        Ok(())
    }

    async fn set_results(&self, request_id: Uuid, result: serde_json::Value) -> Result<()> {
        let mut results = self.results.write().await;
        results.insert(request_id, result);
        Ok(())
    }

    async fn add_error(&self, request_id: Uuid, error: TrackedError) -> Result<()> {
        let mut errors = self.errors.write().await;
        errors.entry(request_id).or_default().push(error);
        Ok(())
    }
}

//
// ================= Postgres Backend =================
//

pub struct PostgresTracker {
    pool: PgPool,
    schema_ready: Arc<OnceCell<()>>,
}

impl PostgresTracker {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            schema_ready: Arc::new(OnceCell::new()),
        }
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS request_tracking (
                      request_id UUID PRIMARY KEY,
                      status TEXT NOT NULL,
                      result TEXT,
                      updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS request_tracking_steps (
                      id BIGSERIAL PRIMARY KEY,
                      request_id UUID NOT NULL,
                      step TEXT NOT NULL,
                      step_status TEXT NOT NULL,
                      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS request_tracking_errors (
                      id BIGSERIAL PRIMARY KEY,
                      request_id UUID NOT NULL,
                      code TEXT NOT NULL,
                      message TEXT NOT NULL,
                      severity TEXT NOT NULL,
                      step TEXT,
                      recoverable BOOLEAN NOT NULL,
                      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(|e| {
                OrchestratorError::DatabaseError(format!(
                    "Failed to initialize tracking schema: {}",
                    e
                ))
            })?;

        Ok(())
    }
}

#[async_trait]
impl TrackingSink for PostgresTracker {
    async fn update_status(&self, request_id: Uuid, status: &str) -> Result<()> {
        self.ensure_schema().await?;
        sqlx::query(
            r#"
            INSERT INTO request_tracking (request_id, status, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (request_id)
            DO UPDATE SET status = $2, updated_at = NOW();
            "#,
        )
        .bind(request_id)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(|e| OrchestratorError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn update_step(&self, request_id: Uuid, step: &str, step_status: &str) -> Result<()> {
        self.ensure_schema().await?;
        sqlx::query(
            r#"
            INSERT INTO request_tracking_steps (request_id, step, step_status)
            VALUES ($1, $2, $3);
            "#,
        )
        .bind(request_id)
        .bind(step)
        .bind(step_status)
        .execute(&self.pool)
        .await
        .map_err(|e| OrchestratorError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn set_results(&self, request_id: Uuid, result: serde_json::Value) -> Result<()> {
        self.ensure_schema().await?;
        sqlx::query(
            r#"
            INSERT INTO request_tracking (request_id, status, result, updated_at)
            VALUES ($1, 'completed', $2, NOW())
            ON CONFLICT (request_id)
            DO UPDATE SET result = $2, updated_at = NOW();
            "#,
        )
        .bind(request_id)
        .bind(result.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| OrchestratorError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn add_error(&self, request_id: Uuid, error: TrackedError) -> Result<()> {
        self.ensure_schema().await?;
        sqlx::query(
            r#"
            INSERT INTO request_tracking_errors
              (request_id, code, message, severity, step, recoverable)
            VALUES ($1, $2, $3, $4, $5, $6);
            "#,
        )
        .bind(request_id)
        .bind(&error.code)
        .bind(&error.message)
        .bind(&error.severity)
        .bind(&error.step)
        .bind(error.recoverable)
        .execute(&self.pool)
        .await
        .map_err(|e| OrchestratorError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

/// Pick the tracking backend from the environment: Postgres when
/// DATABASE_URL is set, in-memory otherwise.
pub fn tracker_from_env() -> Arc<dyn TrackingSink> {
    match env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => match PgPool::connect_lazy(&url) {
            Ok(pool) => {
                info!("Tracking backend: postgres");
                Arc::new(PostgresTracker::new(pool))
            }
            Err(e) => {
                tracing::warn!("Invalid DATABASE_URL ({}); tracking in memory", e);
                Arc::new(InMemoryTracker::new())
            }
        },
        _ => {
            info!("Tracking backend: in-memory");
            Arc::new(InMemoryTracker::new())
        }
    }
}
