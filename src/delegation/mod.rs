//! Task delegation
//!
//! Enforces agent capacity through the registry, transitions task status, and
//! schedules one asynchronous completion event per delegated task. Expected
//! failures (unknown agent, capacity, offline) come back as values on the
//! outcome, never as errors.

use crate::models::{AgentMessage, AgentTask, AgentType, MessageType, TaskStatus};
use crate::queue::MessageQueue;
use crate::registry::{AdjustOp, AgentRegistry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationOutcome {
    pub success: bool,
    pub task_id: Uuid,
    pub assigned_to: Option<AgentType>,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl DelegationOutcome {
    pub fn rejected(task_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            success: false,
            task_id,
            assigned_to: None,
            estimated_completion: None,
            error: Some(error.into()),
        }
    }
}

/// Delegates tasks to capacity-bounded agents and simulates their execution
/// with a timer-based completion event per task. Delegated tasks are retained
/// on the board indefinitely for audit.
pub struct TaskDelegator {
    registry: Arc<AgentRegistry>,
    queue: Arc<MessageQueue>,
    board: Arc<RwLock<HashMap<Uuid, AgentTask>>>,
}

impl TaskDelegator {
    pub fn new(registry: Arc<AgentRegistry>, queue: Arc<MessageQueue>) -> Self {
        Self {
            registry,
            queue,
            board: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Delegate one task. On success the task is held by its agent until the
    /// scheduled completion fires or the task is cancelled.
    pub async fn delegate(&self, mut task: AgentTask) -> DelegationOutcome {
        let role = task.agent_role;

        let Some(status) = self.registry.get(role).await else {
            return DelegationOutcome::rejected(task.id, "unknown agent");
        };

        if let Err(e) = self.registry.adjust(role, task.id, AdjustOp::Add).await {
            return DelegationOutcome::rejected(task.id, e.to_string());
        }

        let duration_ms = (status.capabilities.average_processing_time_ms as f64
            * task.complexity.factor()) as u64;
        let estimated_completion = Utc::now() + chrono::Duration::milliseconds(duration_ms as i64);

        task.status = TaskStatus::Assigned;
        task.assigned_to = Some(role);
        task.estimated_completion = Some(estimated_completion);
        task.updated_at = Utc::now();

        debug!(
            task_id = %task.id,
            agent = %role,
            duration_ms,
            "Task delegated"
        );

        let outcome = DelegationOutcome {
            success: true,
            task_id: task.id,
            assigned_to: Some(role),
            estimated_completion: Some(estimated_completion),
            error: None,
        };

        let task_id = task.id;
        let conversation_id = task.conversation_id;
        let priority = task.priority;
        {
            let mut board = self.board.write().await;
            board.insert(task_id, task);
        }

        let registry = Arc::clone(&self.registry);
        let queue = Arc::clone(&self.queue);
        let board = Arc::clone(&self.board);
        tokio::spawn(async move {
            run_to_completion(registry, queue, board, task_id, conversation_id, role, priority, duration_ms)
                .await;
        });

        outcome
    }

    /// Cancel an in-flight task. Returns false when the task is unknown or
    /// already terminal. Cancellation and completion serialize on the board
    /// lock, so a cancelled task's completion callback never mutates state.
    pub async fn cancel(&self, task_id: Uuid) -> bool {
        let mut board = self.board.write().await;
        let Some(task) = board.get_mut(&task_id) else {
            return false;
        };
        if task.status.is_terminal() {
            return false;
        }

        task.set_status(TaskStatus::Cancelled);
        if let Some(role) = task.assigned_to {
            if let Err(e) = self.registry.adjust(role, task_id, AdjustOp::Remove).await {
                warn!(task_id = %task_id, error = %e, "Failed to release capacity on cancel");
            }
        }

        debug!(task_id = %task_id, "Task cancelled");
        true
    }

    /// Board snapshot of one task.
    pub async fn task(&self, task_id: Uuid) -> Option<AgentTask> {
        let board = self.board.read().await;
        board.get(&task_id).cloned()
    }

    /// Board snapshot of every task belonging to a conversation, in creation
    /// order.
    pub async fn tasks_for_conversation(&self, conversation_id: Uuid) -> Vec<AgentTask> {
        let board = self.board.read().await;
        let mut tasks: Vec<AgentTask> = board
            .values()
            .filter(|t| t.conversation_id == conversation_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.created_at);
        tasks
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_to_completion(
    registry: Arc<AgentRegistry>,
    queue: Arc<MessageQueue>,
    board: Arc<RwLock<HashMap<Uuid, AgentTask>>>,
    task_id: Uuid,
    conversation_id: Uuid,
    role: AgentType,
    priority: crate::models::TaskPriority,
    duration_ms: u64,
) {
    // Mark in-progress unless cancellation already won.
    {
        let mut board = board.write().await;
        match board.get_mut(&task_id) {
            Some(task) if task.status == TaskStatus::Assigned => {
                task.set_status(TaskStatus::InProgress);
            }
            _ => return,
        }
    }

    tokio::time::sleep(std::time::Duration::from_millis(duration_ms)).await;

    let mut board = board.write().await;
    let Some(task) = board.get_mut(&task_id) else {
        return;
    };
    if task.status.is_terminal() {
        // Cancelled while sleeping; capacity was already released.
        return;
    }

    task.set_status(TaskStatus::Completed);
    if let Err(e) = registry.adjust(role, task_id, AdjustOp::Remove).await {
        warn!(task_id = %task_id, error = %e, "Failed to release capacity on completion");
    }

    queue.send(
        AgentMessage::new(
            role.to_string(),
            "orchestrator",
            MessageType::Update,
            serde_json::json!({
                "task_id": task_id,
                "status": "completed",
            }),
        )
        .with_priority(priority)
        .with_conversation(conversation_id),
    );

    debug!(task_id = %task_id, agent = %role, "Task completed");
}
