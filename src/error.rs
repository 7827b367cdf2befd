//! Error types for the agent orchestration engine

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[derive(Error, Debug)]
pub enum OrchestratorError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Understanding error: {0}")]
    UnderstandingError(String),

    #[error("Planning error: {0}")]
    PlanningError(String),

    #[error("Delegation error: {0}")]
    DelegationError(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(uuid::Uuid),

    #[error("Invalid phase transition: {0}")]
    InvalidPhaseTransition(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Tracking error: {0}")]
    TrackingError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("UUID parse error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
