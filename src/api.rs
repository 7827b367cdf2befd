//! REST API server for the orchestration engine
//!
//! Thin HTTP surface over the orchestrator, agent registry and model
//! registry. All domain failures come back as value-level `ApiResponse`
//! payloads.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::models::ModelDefinition;
use crate::orchestrator::Orchestrator;
use crate::registry::AgentRegistry;
use crate::selection::ModelRegistry;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ConversationRequest {
    pub user_id: Option<String>,
    pub request_type: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct CleanupRequest {
    pub max_age_hours: i64,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub agents: Arc<AgentRegistry>,
    pub models: Arc<ModelRegistry>,
}

/// =============================
/// Helpers
/// =============================

fn stable_uuid_from_string(input: &str) -> Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

fn parse_or_stable_uuid(value: Option<&str>, fallback_seed: &str) -> Uuid {
    match value {
        Some(v) if !v.trim().is_empty() => {
            Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v))
        }
        _ => stable_uuid_from_string(fallback_seed),
    }
}

/// =============================
/// Handlers
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn create_conversation(
    State(state): State<ApiState>,
    Json(req): Json<ConversationRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    info!("Received conversation request: {}", req.request_type);

    let user_id = parse_or_stable_uuid(req.user_id.as_deref(), "anonymous-user");

    match state
        .orchestrator
        .process_user_request(user_id, &req.request_type, req.parameters)
        .await
    {
        Ok(ctx) => (StatusCode::OK, Json(ApiResponse::success(ctx))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Orchestration failed: {}", e))),
        ),
    }
}

async fn get_conversation(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.orchestrator.get_conversation_context(id).await {
        Some(ctx) => (StatusCode::OK, Json(ApiResponse::success(ctx))),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("conversation {} not found", id))),
        ),
    }
}

async fn delegate_task(
    State(state): State<ApiState>,
    Path((id, task_id)): Path<(Uuid, Uuid)>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.orchestrator.delegate_task(id, task_id).await {
        Ok(outcome) => (StatusCode::OK, Json(ApiResponse::success(outcome))),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(e.to_string())),
        ),
    }
}

async fn cancel_task(
    State(state): State<ApiState>,
    Path((id, task_id)): Path<(Uuid, Uuid)>,
) -> (StatusCode, Json<ApiResponse>) {
    let cancelled = state.orchestrator.cancel_task(id, task_id).await;
    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "cancelled": cancelled
        }))),
    )
}

async fn cleanup_conversations(
    State(state): State<ApiState>,
    Json(req): Json<CleanupRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let removed = state
        .orchestrator
        .cleanup_completed_conversations(req.max_age_hours)
        .await;
    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "removed": removed
        }))),
    )
}

async fn list_agents(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    let snapshot = state.agents.snapshot().await;
    (StatusCode::OK, Json(ApiResponse::success(snapshot)))
}

async fn model_health(
    State(state): State<ApiState>,
    Path(model_id): Path<String>,
) -> (StatusCode, Json<ApiResponse>) {
    let health = state.models.model_health(&model_id).await;
    (StatusCode::OK, Json(ApiResponse::success(health)))
}

async fn register_model(
    State(state): State<ApiState>,
    Json(definition): Json<ModelDefinition>,
) -> (StatusCode, Json<ApiResponse>) {
    let outcome = state.models.register_custom_model(definition).await;
    if outcome.success {
        (StatusCode::OK, Json(ApiResponse::success(outcome)))
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                outcome.error.unwrap_or_else(|| "registration rejected".to_string()),
            )),
        )
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/conversations", post(create_conversation))
        .route("/api/v1/conversations/cleanup", post(cleanup_conversations))
        .route("/api/v1/conversations/:id", get(get_conversation))
        .route(
            "/api/v1/conversations/:id/tasks/:task_id/delegate",
            post(delegate_task),
        )
        .route(
            "/api/v1/conversations/:id/tasks/:task_id/cancel",
            post(cancel_task),
        )
        .route("/api/v1/agents", get(list_agents))
        .route("/api/v1/models", post(register_model))
        .route("/api/v1/models/:id/health", get(model_health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
