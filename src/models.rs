//! Core data models for the agent orchestration engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use uuid::Uuid;

//
// ================= Enums =================
//

/// Specialized worker roles with bounded concurrent capacity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Research,
    Analysis,
    Compliance,
    Synthesis,
    Planning,
}

impl AgentType {
    pub const ALL: [AgentType; 5] = [
        AgentType::Research,
        AgentType::Analysis,
        AgentType::Compliance,
        AgentType::Synthesis,
        AgentType::Planning,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    MarketResearch,
    DataAnalysis,
    ComplianceReview,
    ReportSynthesis,
    Planning,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskComplexity {
    Simple,
    Medium,
    Complex,
}

impl TaskComplexity {
    /// Multiplier applied to an agent's average processing time when
    /// estimating completion.
    pub fn factor(&self) -> f64 {
        match self {
            TaskComplexity::Simple => 0.5,
            TaskComplexity::Medium => 1.0,
            TaskComplexity::Complex => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Task lifecycle. Transitions are forward-only; `Completed`, `Failed` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// Conversation lifecycle. Strictly forward; `Completed` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConversationPhase {
    Understanding,
    Planning,
    Executing,
    Synthesizing,
    Completed,
}

impl ConversationPhase {
    fn rank(&self) -> u8 {
        match self {
            ConversationPhase::Understanding => 0,
            ConversationPhase::Planning => 1,
            ConversationPhase::Executing => 2,
            ConversationPhase::Synthesizing => 3,
            ConversationPhase::Completed => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversationPhase::Completed)
    }

    /// The next phase in the pipeline, or `None` when terminal.
    pub fn next(&self) -> Option<ConversationPhase> {
        match self {
            ConversationPhase::Understanding => Some(ConversationPhase::Planning),
            ConversationPhase::Planning => Some(ConversationPhase::Executing),
            ConversationPhase::Executing => Some(ConversationPhase::Synthesizing),
            ConversationPhase::Synthesizing => Some(ConversationPhase::Completed),
            ConversationPhase::Completed => None,
        }
    }

    pub fn can_advance_to(&self, target: ConversationPhase) -> bool {
        target.rank() > self.rank()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Idle,
    Busy,
    Offline,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Request,
    Response,
    Update,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

//
// ================= Agent Capabilities & Status =================
//

/// Static capability description for one agent type. Immutable after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCapabilities {
    pub supported_tasks: BTreeSet<TaskType>,
    pub max_concurrent_tasks: usize,
    pub average_processing_time_ms: u64,
    pub reliability: f64,
    pub specializations: Vec<String>,
}

/// Live view of one agent: availability plus the set of task ids it is
/// currently holding. `current_tasks.len() <= max_concurrent_tasks` always.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatus {
    pub agent_type: AgentType,
    pub availability: Availability,
    pub current_tasks: BTreeSet<Uuid>,
    pub capabilities: AgentCapabilities,
}

//
// ================= Task =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTask {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub task_type: TaskType,
    pub complexity: TaskComplexity,
    pub domain: String,
    pub priority: TaskPriority,
    pub agent_role: AgentType,
    pub description: String,
    pub parameters: serde_json::Value,
    /// Informational predecessor ids; not enforced as a blocking DAG.
    pub dependencies: Vec<Uuid>,
    pub status: TaskStatus,
    pub assigned_to: Option<AgentType>,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentTask {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        conversation_id: Uuid,
        task_type: TaskType,
        complexity: TaskComplexity,
        domain: impl Into<String>,
        priority: TaskPriority,
        agent_role: AgentType,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            task_type,
            complexity,
            domain: domain.into(),
            priority,
            agent_role,
            description: description.into(),
            parameters,
            dependencies: Vec::new(),
            status: TaskStatus::Pending,
            assigned_to: None,
            estimated_completion: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition the task status, refreshing `updated_at`.
    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

//
// ================= Conversation =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    pub id: Uuid,
    pub user_id: Uuid,
    pub request_type: String,
    pub parameters: serde_json::Value,
    pub tasks: Vec<AgentTask>,
    pub current_phase: ConversationPhase,
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationContext {
    pub fn new(user_id: Uuid, request_type: impl Into<String>, parameters: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            request_type: request_type.into(),
            parameters,
            tasks: Vec::new(),
            current_phase: ConversationPhase::Understanding,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Move forward to `target`. Backward moves are rejected.
    pub fn advance_phase(&mut self, target: ConversationPhase) -> bool {
        if !self.current_phase.can_advance_to(target) {
            return false;
        }
        self.current_phase = target;
        self.updated_at = Utc::now();
        true
    }

    /// Fail-closed: record the error and force the terminal phase. Tasks
    /// already created remain in whatever state they reached.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.metadata
            .insert("error".to_string(), serde_json::Value::String(message.into()));
        self.current_phase = ConversationPhase::Completed;
        self.updated_at = Utc::now();
    }

    pub fn error(&self) -> Option<&str> {
        self.metadata.get("error").and_then(|v| v.as_str())
    }
}

//
// ================= Messages =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub priority: TaskPriority,
    pub timestamp: DateTime<Utc>,
    pub conversation_id: Option<Uuid>,
    pub request_id: Option<Uuid>,
}

/// Ephemeral inter-agent message; lives only in the queue until drained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    pub sender: String,
    pub recipient: String,
    pub message_type: MessageType,
    pub content: serde_json::Value,
    pub metadata: MessageMetadata,
}

impl AgentMessage {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        message_type: MessageType,
        content: serde_json::Value,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            message_type,
            content,
            metadata: MessageMetadata {
                priority: TaskPriority::Medium,
                timestamp: Utc::now(),
                conversation_id: None,
                request_id: None,
            },
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.metadata.priority = priority;
        self
    }

    pub fn with_conversation(mut self, conversation_id: Uuid) -> Self {
        self.metadata.conversation_id = Some(conversation_id);
        self
    }

    pub fn with_request(mut self, request_id: Uuid) -> Self {
        self.metadata.request_id = Some(request_id);
        self
    }
}

//
// ================= Model Definitions =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub id: String,
    pub name: String,
    pub version: String,
    pub provider: String,
    pub capabilities: Vec<String>,
    pub limitations: Vec<String>,
    pub configuration_schema: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerformanceThresholds {
    pub accuracy: f64,
    pub latency_ms: f64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSelectionConfig {
    /// Always resolvable; the last resort of every selection path.
    pub default_model: String,
    pub performance_thresholds: PerformanceThresholds,
    /// Ordered candidate ids; may name unregistered or failed models.
    pub fallback_chain: Vec<String>,
    pub evaluation_interval_ms: u64,
    pub max_retries: u32,
}

impl Default for ModelSelectionConfig {
    fn default() -> Self {
        Self {
            default_model: "claude-sonnet-3.7".to_string(),
            performance_thresholds: PerformanceThresholds {
                accuracy: 0.8,
                latency_ms: 2_000.0,
                error_rate: 0.05,
            },
            fallback_chain: vec![
                "claude-sonnet-3.7".to_string(),
                "gemini-2.0-flash".to_string(),
                "claude-haiku-3.5".to_string(),
            ],
            evaluation_interval_ms: 60_000,
            max_retries: 3,
        }
    }
}

//
// ================= Performance & Health =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub accuracy: f64,
    pub latency_ms: f64,
    pub throughput: f64,
    pub cost_per_request: f64,
    pub error_rate: f64,
    #[serde(default)]
    pub custom_metrics: HashMap<String, f64>,
}

impl Default for PerformanceMetrics {
    /// Baseline metrics used when a model has no recorded history yet.
    fn default() -> Self {
        Self {
            accuracy: 0.85,
            latency_ms: 1_200.0,
            throughput: 10.0,
            cost_per_request: 0.002,
            error_rate: 0.01,
            custom_metrics: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceObservation {
    pub metrics: PerformanceMetrics,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelHealth {
    pub status: HealthStatus,
    pub metrics: PerformanceMetrics,
    pub issues: Vec<String>,
}

//
// ================= Display =================
//

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentType::Research => "research",
            AgentType::Analysis => "analysis",
            AgentType::Compliance => "compliance",
            AgentType::Synthesis => "synthesis",
            AgentType::Planning => "planning",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Assigned => "assigned",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConversationPhase::Understanding => "understanding",
            ConversationPhase::Planning => "planning",
            ConversationPhase::Executing => "executing",
            ConversationPhase::Synthesizing => "synthesizing",
            ConversationPhase::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_is_forward_only() {
        let mut ctx = ConversationContext::new(
            Uuid::new_v4(),
            "portfolio_review",
            serde_json::json!({}),
        );
        assert!(ctx.advance_phase(ConversationPhase::Planning));
        assert!(ctx.advance_phase(ConversationPhase::Executing));
        assert!(!ctx.advance_phase(ConversationPhase::Understanding));
        assert_eq!(ctx.current_phase, ConversationPhase::Executing);
    }

    #[test]
    fn test_fail_forces_terminal_phase() {
        let mut ctx =
            ConversationContext::new(Uuid::new_v4(), "analysis", serde_json::json!({}));
        ctx.fail("understanding failed");
        assert_eq!(ctx.current_phase, ConversationPhase::Completed);
        assert_eq!(ctx.error(), Some("understanding failed"));
        assert!(!ctx.advance_phase(ConversationPhase::Planning));
    }

    #[test]
    fn test_complexity_factor() {
        assert_eq!(TaskComplexity::Simple.factor(), 0.5);
        assert_eq!(TaskComplexity::Medium.factor(), 1.0);
        assert_eq!(TaskComplexity::Complex.factor(), 2.0);
    }

    #[test]
    fn test_task_status_serializes_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
