//! Conversation orchestrator
//!
//! Turns a user request into a ConversationContext through two strictly
//! sequential completion calls (understand, then plan), flattens the plan
//! into agent tasks, and hands tasks to the delegator on demand. Any
//! understanding/planning failure is fail-closed: the conversation jumps to
//! its terminal phase with `metadata.error` set and already-created tasks
//! left untouched.

use crate::audit::{compute_request_hash, REQUEST_HASH_KEY};
use crate::delegation::{DelegationOutcome, TaskDelegator};
use crate::error::OrchestratorError;
use crate::llm::{CompletionClient, CompletionRequest};
use crate::models::{
    AgentMessage, AgentTask, AgentType, ConversationContext, ConversationPhase, MessageType,
    TaskComplexity, TaskPriority, TaskStatus, TaskType,
};
use crate::queue::MessageQueue;
use crate::roles;
use crate::selection::ModelRegistry;
use crate::tracking::{TrackedError, TrackingSink};
use crate::Result;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

//
// ================= Plan Schemas =================
//

/// Output of the understanding call. Fail-closed: every field is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestUnderstanding {
    pub understanding: String,
    pub objectives: Vec<String>,
    pub analysis_type: String,
    pub constraints: Vec<String>,
    pub deliverables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedPhase {
    pub name: String,
    pub tasks: Vec<String>,
    pub dependencies: Vec<String>,
    pub estimated_duration: u64,
}

/// Output of the planning call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkPlan {
    pub phases: Vec<PlannedPhase>,
    pub total_estimated_duration: u64,
}

//
// ================= Orchestrator =================
//

/// Top-level coordinator. Owns the conversation store; collaborators are
/// constructor-injected so multiple independent instances can coexist.
pub struct Orchestrator {
    llm: Arc<dyn CompletionClient>,
    delegator: Arc<TaskDelegator>,
    queue: Arc<MessageQueue>,
    models: Arc<ModelRegistry>,
    tracker: Arc<dyn TrackingSink>,
    conversations: RwLock<HashMap<Uuid, ConversationContext>>,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn CompletionClient>,
        delegator: Arc<TaskDelegator>,
        queue: Arc<MessageQueue>,
        models: Arc<ModelRegistry>,
        tracker: Arc<dyn TrackingSink>,
    ) -> Self {
        Self {
            llm,
            delegator,
            queue,
            models,
            tracker,
            conversations: RwLock::new(HashMap::new()),
        }
    }

    /// Run understanding and planning for a user request, producing a context
    /// in the `executing` phase with its task plan attached. Delegation is a
    /// separate, explicit step so callers can inspect the plan first.
    ///
    /// Expected failures never surface as `Err`; they are recorded on the
    /// returned context.
    pub async fn process_user_request(
        &self,
        user_id: Uuid,
        request_type: &str,
        parameters: serde_json::Value,
    ) -> Result<ConversationContext> {
        let mut ctx = ConversationContext::new(user_id, request_type, parameters);
        ctx.metadata.insert(
            REQUEST_HASH_KEY.to_string(),
            serde_json::Value::String(compute_request_hash(
                ctx.user_id,
                &ctx.request_type,
                &ctx.parameters,
            )),
        );

        info!(
            conversation_id = %ctx.id,
            user_id = %user_id,
            request_type = %request_type,
            "Processing user request"
        );

        self.track_status(ctx.id, "understanding").await;

        // === UNDERSTAND ===
        let selected = self
            .models
            .select_for_role(
                AgentType::Planning,
                TaskType::Planning,
                TaskComplexity::Medium,
                &ctx,
            )
            .await;

        let understanding_prompt = build_understanding_prompt(&ctx.request_type, &ctx.parameters);
        let response = match self
            .llm
            .complete(CompletionRequest {
                prompt: understanding_prompt,
                model_id: selected.model_id.clone(),
                temperature: selected.configuration.temperature,
                max_tokens: selected.configuration.max_tokens,
            })
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Ok(self
                    .abort_conversation(ctx, "understanding", &e.to_string())
                    .await);
            }
        };

        let understanding = match parse_understanding(&response.completion) {
            Ok(understanding) => understanding,
            Err(e) => {
                return Ok(self
                    .abort_conversation(ctx, "understanding", &e.to_string())
                    .await);
            }
        };

        if let Ok(value) = serde_json::to_value(&understanding) {
            ctx.metadata.insert("understanding".to_string(), value);
        }

        ctx.advance_phase(ConversationPhase::Planning);
        self.track_step(ctx.id, "understanding", "completed").await;
        self.track_status(ctx.id, "planning").await;

        // === PLAN ===
        let planning_prompt = build_planning_prompt(&understanding);
        let response = match self
            .llm
            .complete(CompletionRequest {
                prompt: planning_prompt,
                model_id: selected.model_id.clone(),
                temperature: selected.configuration.temperature,
                max_tokens: selected.configuration.max_tokens,
            })
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Ok(self.abort_conversation(ctx, "planning", &e.to_string()).await);
            }
        };

        let plan = match parse_plan(&response.completion) {
            Ok(plan) => plan,
            Err(e) => {
                return Ok(self.abort_conversation(ctx, "planning", &e.to_string()).await);
            }
        };

        // === FLATTEN ===
        let domain = ctx
            .parameters
            .get("domain")
            .and_then(|v| v.as_str())
            .unwrap_or("financial")
            .to_string();

        let mut previous_phase_ids: Vec<Uuid> = Vec::new();
        for phase in &plan.phases {
            let mut phase_ids = Vec::new();
            for task_name in &phase.tasks {
                let role = roles::resolve_agent_role(task_name, &phase.name);
                let mut task = AgentTask::new(
                    ctx.id,
                    roles::task_type_for_role(role),
                    roles::derive_complexity(task_name),
                    domain.clone(),
                    TaskPriority::Medium,
                    role,
                    task_name.clone(),
                    serde_json::json!({
                        "phase": phase.name,
                        "estimated_duration": phase.estimated_duration,
                    }),
                );
                task.dependencies = previous_phase_ids.clone();
                phase_ids.push(task.id);
                ctx.tasks.push(task);
            }
            previous_phase_ids = phase_ids;
        }

        ctx.metadata.insert(
            "total_estimated_duration".to_string(),
            serde_json::json!(plan.total_estimated_duration),
        );

        ctx.advance_phase(ConversationPhase::Executing);
        self.track_step(ctx.id, "planning", "completed").await;
        self.track_status(ctx.id, "executing").await;

        debug!(
            conversation_id = %ctx.id,
            task_count = ctx.tasks.len(),
            "Plan flattened into tasks"
        );

        let snapshot = ctx.clone();
        let mut conversations = self.conversations.write().await;
        conversations.insert(ctx.id, ctx);

        Ok(snapshot)
    }

    /// Delegate one planned task. On success, publishes a `Request` message
    /// addressed to the assigned agent and refreshes the stored context copy.
    pub async fn delegate_task(
        &self,
        conversation_id: Uuid,
        task_id: Uuid,
    ) -> Result<DelegationOutcome> {
        let task = {
            let conversations = self.conversations.read().await;
            let ctx = conversations
                .get(&conversation_id)
                .ok_or(OrchestratorError::ConversationNotFound(conversation_id))?;
            ctx.tasks
                .iter()
                .find(|t| t.id == task_id)
                .cloned()
                .ok_or_else(|| {
                    OrchestratorError::DelegationError(format!(
                        "task {} not part of conversation",
                        task_id
                    ))
                })?
        };

        if task.status != TaskStatus::Pending {
            return Ok(DelegationOutcome::rejected(
                task.id,
                format!("task already {}", task.status),
            ));
        }

        let description = task.description.clone();
        let priority = task.priority;
        let outcome = self.delegator.delegate(task).await;

        if outcome.success {
            if let Some(agent) = outcome.assigned_to {
                self.queue.send(
                    AgentMessage::new(
                        "orchestrator",
                        agent.to_string(),
                        MessageType::Request,
                        serde_json::json!({
                            "task_id": task_id,
                            "description": description,
                        }),
                    )
                    .with_priority(priority)
                    .with_conversation(conversation_id)
                    .with_request(task_id),
                );
            }
            self.refresh_conversation(conversation_id).await;
            self.track_step(conversation_id, &description, "assigned").await;
        } else if let Some(error) = &outcome.error {
            self.track_error(conversation_id, "delegation", error, "executing")
                .await;
        }

        Ok(outcome)
    }

    /// Cancel an in-flight task and refresh the stored context copy.
    pub async fn cancel_task(&self, conversation_id: Uuid, task_id: Uuid) -> bool {
        let cancelled = self.delegator.cancel(task_id).await;
        if cancelled {
            self.refresh_conversation(conversation_id).await;
        }
        cancelled
    }

    /// Stored context with task statuses refreshed from the delegator board.
    pub async fn get_conversation_context(&self, id: Uuid) -> Option<ConversationContext> {
        self.refresh_conversation(id).await;
        let conversations = self.conversations.read().await;
        conversations.get(&id).cloned()
    }

    /// Step the conversation forward one phase. Completing the conversation
    /// reports final results to the tracking sink.
    pub async fn advance_phase(&self, id: Uuid) -> Result<ConversationPhase> {
        let mut conversations = self.conversations.write().await;
        let ctx = conversations
            .get_mut(&id)
            .ok_or(OrchestratorError::ConversationNotFound(id))?;

        let next = ctx.current_phase.next().ok_or_else(|| {
            OrchestratorError::InvalidPhaseTransition("conversation already completed".to_string())
        })?;
        ctx.advance_phase(next);

        if next == ConversationPhase::Completed {
            let summary = serde_json::json!({
                "conversation_id": id,
                "tasks": ctx.tasks.len(),
                "completed_tasks": ctx
                    .tasks
                    .iter()
                    .filter(|t| t.status == TaskStatus::Completed)
                    .count(),
            });
            drop(conversations);
            if let Err(e) = self.tracker.set_results(id, summary).await {
                warn!(conversation_id = %id, error = %e, "Tracking set_results failed");
            }
            self.track_status(id, "completed").await;
        }

        Ok(next)
    }

    /// Remove every terminal conversation older than `max_age_hours`.
    /// Non-terminal or recently-touched conversations are untouched.
    pub async fn cleanup_completed_conversations(&self, max_age_hours: i64) -> usize {
        let cutoff = Utc::now() - Duration::hours(max_age_hours);
        let mut conversations = self.conversations.write().await;
        let before = conversations.len();
        conversations.retain(|_, ctx| {
            !(ctx.current_phase.is_terminal() && ctx.updated_at < cutoff)
        });
        let removed = before - conversations.len();
        if removed > 0 {
            info!(removed, "Cleaned up completed conversations");
        }
        removed
    }

    //
    // ================= Internals =================
    //

    /// Fail-closed shutdown of a conversation mid-pipeline.
    async fn abort_conversation(
        &self,
        mut ctx: ConversationContext,
        step: &str,
        message: &str,
    ) -> ConversationContext {
        warn!(
            conversation_id = %ctx.id,
            step,
            error = %message,
            "Conversation aborted"
        );

        ctx.fail(format!("{} failed: {}", step, message));
        self.track_error(ctx.id, step, message, step).await;
        self.track_status(ctx.id, "failed").await;

        let snapshot = ctx.clone();
        let mut conversations = self.conversations.write().await;
        conversations.insert(ctx.id, ctx);
        snapshot
    }

    /// Pull fresh task snapshots from the delegator board into the stored
    /// context copy.
    async fn refresh_conversation(&self, id: Uuid) {
        let mut conversations = self.conversations.write().await;
        let Some(ctx) = conversations.get_mut(&id) else {
            return;
        };
        for task in &mut ctx.tasks {
            if let Some(fresh) = self.delegator.task(task.id).await {
                *task = fresh;
            }
        }
    }

    async fn track_status(&self, id: Uuid, status: &str) {
        if let Err(e) = self.tracker.update_status(id, status).await {
            warn!(conversation_id = %id, error = %e, "Tracking status update failed");
        }
    }

    async fn track_step(&self, id: Uuid, step: &str, step_status: &str) {
        if let Err(e) = self.tracker.update_step(id, step, step_status).await {
            warn!(conversation_id = %id, error = %e, "Tracking step update failed");
        }
    }

    async fn track_error(&self, id: Uuid, code: &str, message: &str, step: &str) {
        let error = TrackedError {
            code: code.to_string(),
            message: message.to_string(),
            severity: "error".to_string(),
            step: Some(step.to_string()),
            recoverable: false,
        };
        if let Err(e) = self.tracker.add_error(id, error).await {
            warn!(conversation_id = %id, error = %e, "Tracking error report failed");
        }
    }
}

//
// ================= Prompts =================
//

fn build_understanding_prompt(request_type: &str, parameters: &serde_json::Value) -> String {
    format!(
        r#"You are the coordination engine of a multi-agent financial research desk.

Understand the user request below. Do not plan yet.

REQUEST TYPE:
{}

PARAMETERS:
{}

Rules:
- Return ONLY valid JSON
- No explanation text
- JSON format:

{{
  "understanding": "...",
  "objectives": ["..."],
  "analysisType": "...",
  "constraints": ["..."],
  "deliverables": ["..."]
}}
"#,
        request_type, parameters
    )
}

fn build_planning_prompt(understanding: &RequestUnderstanding) -> String {
    let agent_descriptions = vec![
        "research – gather market data, news and coverage",
        "analysis – evaluate, model and quantify",
        "compliance – regulatory and policy review",
        "synthesis – compile and draft deliverables",
        "planning – sequence and prioritize work",
    ];

    format!(
        r#"You are the planning engine of a multi-agent financial research desk.

Create a phased execution plan for the understood request.

UNDERSTANDING:
{}

OBJECTIVES:
{:?}

CONSTRAINTS:
{:?}

DELIVERABLES:
{:?}

Available agents:
- {}

Rules:
- Task names are short imperative phrases
- dependencies reference earlier phase names only
- estimatedDuration is minutes per phase
- Return ONLY valid JSON
- No explanation text
- JSON format:

{{
  "phases": [
    {{
      "name": "Research",
      "tasks": ["..."],
      "dependencies": [],
      "estimatedDuration": 10
    }}
  ],
  "totalEstimatedDuration": 10
}}
"#,
        understanding.understanding,
        understanding.objectives,
        understanding.constraints,
        understanding.deliverables,
        agent_descriptions.join("\n- "),
    )
}

//
// ================= Parsing =================
//

fn strip_code_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn parse_understanding(response: &str) -> Result<RequestUnderstanding> {
    let cleaned = strip_code_fences(response);
    serde_json::from_str(cleaned).map_err(|e| {
        OrchestratorError::UnderstandingError(format!(
            "Failed to parse understanding response: {} | raw={}",
            e, response
        ))
    })
}

fn parse_plan(response: &str) -> Result<WorkPlan> {
    let cleaned = strip_code_fences(response);
    let plan: WorkPlan = serde_json::from_str(cleaned).map_err(|e| {
        OrchestratorError::PlanningError(format!(
            "Failed to parse plan response: {} | raw={}",
            e, response
        ))
    })?;

    if plan.phases.is_empty() {
        return Err(OrchestratorError::PlanningError(
            "Plan contains no phases".to_string(),
        ));
    }
    if plan.phases.iter().any(|p| p.tasks.is_empty()) {
        return Err(OrchestratorError::PlanningError(
            "Plan contains an empty phase".to_string(),
        ));
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockCompletionClient;
    use crate::registry::AgentRegistry;
    use crate::tracking::InMemoryTracker;
    use serde_json::json;

    const UNDERSTANDING_JSON: &str = r#"{
        "understanding": "Review a tech-heavy portfolio for concentration risk",
        "objectives": ["assess concentration risk", "propose rebalancing"],
        "analysisType": "portfolio_review",
        "constraints": ["no derivatives"],
        "deliverables": ["summary report"]
    }"#;

    const PLAN_JSON: &str = r#"```json
    {
        "phases": [
            {
                "name": "Research",
                "tasks": ["gather sector data", "collect analyst coverage"],
                "dependencies": [],
                "estimatedDuration": 10
            },
            {
                "name": "Analysis and Reporting",
                "tasks": ["evaluate portfolio risk metrics", "draft final report summary"],
                "dependencies": ["Research"],
                "estimatedDuration": 20
            }
        ],
        "totalEstimatedDuration": 30
    }
    ```"#;

    struct Harness {
        orchestrator: Orchestrator,
        queue: Arc<MessageQueue>,
        tracker: Arc<InMemoryTracker>,
    }

    fn harness(llm: MockCompletionClient) -> Harness {
        let registry = Arc::new(AgentRegistry::with_defaults());
        let queue = Arc::new(MessageQueue::new());
        let delegator = Arc::new(TaskDelegator::new(registry, Arc::clone(&queue)));
        let models = Arc::new(ModelRegistry::with_defaults());
        let tracker = Arc::new(InMemoryTracker::new());

        let orchestrator = Orchestrator::new(
            Arc::new(llm),
            delegator,
            Arc::clone(&queue),
            models,
            Arc::clone(&tracker) as Arc<dyn TrackingSink>,
        );

        Harness {
            orchestrator,
            queue,
            tracker,
        }
    }

    #[tokio::test]
    async fn test_process_request_builds_task_plan() {
        let h = harness(MockCompletionClient::scripted(vec![
            UNDERSTANDING_JSON,
            PLAN_JSON,
        ]));

        let ctx = h
            .orchestrator
            .process_user_request(Uuid::new_v4(), "portfolio_review", json!({}))
            .await
            .unwrap();

        assert_eq!(ctx.current_phase, ConversationPhase::Executing);
        assert!(ctx.error().is_none());
        assert_eq!(ctx.tasks.len(), 4);
        assert!(ctx.metadata.contains_key("understanding"));
        assert_eq!(ctx.metadata["total_estimated_duration"], json!(30));

        let roles: Vec<AgentType> = ctx.tasks.iter().map(|t| t.agent_role).collect();
        assert_eq!(
            roles,
            vec![
                AgentType::Research,
                AgentType::Research,
                AgentType::Analysis,
                AgentType::Synthesis
            ]
        );

        // Second-phase tasks carry first-phase ids as informational deps.
        let first_phase_ids: Vec<Uuid> = ctx.tasks[..2].iter().map(|t| t.id).collect();
        assert_eq!(ctx.tasks[2].dependencies, first_phase_ids);
        assert_eq!(ctx.tasks[3].dependencies, first_phase_ids);

        // All tasks start pending; delegation is explicit.
        assert!(ctx.tasks.iter().all(|t| t.status == TaskStatus::Pending));
        assert!(h.queue.is_empty());
        assert_eq!(
            h.tracker.status(ctx.id).await.as_deref(),
            Some("executing")
        );
    }

    #[tokio::test]
    async fn test_understanding_call_failure_is_fail_closed() {
        let h = harness(MockCompletionClient::failing("simulated outage"));

        let ctx = h
            .orchestrator
            .process_user_request(Uuid::new_v4(), "portfolio_review", json!({}))
            .await
            .unwrap();

        assert_eq!(ctx.current_phase, ConversationPhase::Completed);
        let error = ctx.error().unwrap();
        assert!(error.contains("understanding"));
        assert!(error.contains("simulated outage"));
        assert!(ctx.tasks.is_empty());

        // Fail-closed conversations stay retrievable until cleanup.
        assert!(h
            .orchestrator
            .get_conversation_context(ctx.id)
            .await
            .is_some());
        assert_eq!(h.tracker.errors(ctx.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_plan_json_aborts() {
        let h = harness(MockCompletionClient::scripted(vec![
            UNDERSTANDING_JSON,
            "here is the plan: research first, then analysis",
        ]));

        let ctx = h
            .orchestrator
            .process_user_request(Uuid::new_v4(), "portfolio_review", json!({}))
            .await
            .unwrap();

        assert_eq!(ctx.current_phase, ConversationPhase::Completed);
        assert!(ctx.error().unwrap().contains("planning"));
        assert!(ctx.tasks.is_empty());
    }

    #[tokio::test]
    async fn test_empty_phases_rejected() {
        let plan = r#"{"phases": [], "totalEstimatedDuration": 0}"#;
        assert!(parse_plan(plan).is_err());

        let plan = r#"{
            "phases": [{"name": "A", "tasks": [], "dependencies": [], "estimatedDuration": 1}],
            "totalEstimatedDuration": 1
        }"#;
        assert!(parse_plan(plan).is_err());
    }

    #[tokio::test]
    async fn test_delegate_task_publishes_request_message() {
        let h = harness(MockCompletionClient::scripted(vec![
            UNDERSTANDING_JSON,
            PLAN_JSON,
        ]));

        let ctx = h
            .orchestrator
            .process_user_request(Uuid::new_v4(), "portfolio_review", json!({}))
            .await
            .unwrap();

        let task_id = ctx.tasks[0].id;
        let outcome = h.orchestrator.delegate_task(ctx.id, task_id).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.assigned_to, Some(AgentType::Research));

        let messages = h.queue.drain();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_type, MessageType::Request);
        assert_eq!(messages[0].recipient, "research");
        assert_eq!(messages[0].metadata.conversation_id, Some(ctx.id));

        let refreshed = h.orchestrator.get_conversation_context(ctx.id).await.unwrap();
        let task = refreshed.tasks.iter().find(|t| t.id == task_id).unwrap();
        assert!(matches!(
            task.status,
            TaskStatus::Assigned | TaskStatus::InProgress | TaskStatus::Completed
        ));

        // Delegating the same task again is rejected as a value.
        let again = h.orchestrator.delegate_task(ctx.id, task_id).await.unwrap();
        assert!(!again.success);
    }

    #[tokio::test]
    async fn test_cleanup_removes_exactly_terminal_aged() {
        let h = harness(MockCompletionClient::scripted(vec![]));

        let fresh_terminal = {
            let mut ctx = ConversationContext::new(Uuid::new_v4(), "a", json!({}));
            ctx.fail("boom");
            ctx
        };
        let old_terminal = {
            let mut ctx = ConversationContext::new(Uuid::new_v4(), "b", json!({}));
            ctx.fail("boom");
            ctx.updated_at = Utc::now() - Duration::hours(48);
            ctx
        };
        let old_active = {
            let mut ctx = ConversationContext::new(Uuid::new_v4(), "c", json!({}));
            ctx.advance_phase(ConversationPhase::Planning);
            ctx.updated_at = Utc::now() - Duration::hours(48);
            ctx
        };

        let (fresh_id, old_id, active_id) =
            (fresh_terminal.id, old_terminal.id, old_active.id);
        {
            let mut store = h.orchestrator.conversations.write().await;
            store.insert(fresh_id, fresh_terminal);
            store.insert(old_id, old_terminal);
            store.insert(active_id, old_active);
        }

        let removed = h.orchestrator.cleanup_completed_conversations(24).await;
        assert_eq!(removed, 1);

        assert!(h.orchestrator.get_conversation_context(old_id).await.is_none());
        assert!(h.orchestrator.get_conversation_context(fresh_id).await.is_some());
        assert!(h
            .orchestrator
            .get_conversation_context(active_id)
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_advance_phase_walks_forward_and_terminates() {
        let h = harness(MockCompletionClient::scripted(vec![
            UNDERSTANDING_JSON,
            PLAN_JSON,
        ]));

        let ctx = h
            .orchestrator
            .process_user_request(Uuid::new_v4(), "portfolio_review", json!({}))
            .await
            .unwrap();

        assert_eq!(
            h.orchestrator.advance_phase(ctx.id).await.unwrap(),
            ConversationPhase::Synthesizing
        );
        assert_eq!(
            h.orchestrator.advance_phase(ctx.id).await.unwrap(),
            ConversationPhase::Completed
        );
        assert!(h.orchestrator.advance_phase(ctx.id).await.is_err());

        assert_eq!(
            h.tracker.status(ctx.id).await.as_deref(),
            Some("completed")
        );
        assert!(h.tracker.result(ctx.id).await.is_some());
    }

    #[tokio::test]
    async fn test_two_sequential_llm_calls() {
        let llm = MockCompletionClient::scripted(vec![UNDERSTANDING_JSON, PLAN_JSON]);
        let registry = Arc::new(AgentRegistry::with_defaults());
        let queue = Arc::new(MessageQueue::new());
        let delegator = Arc::new(TaskDelegator::new(registry, Arc::clone(&queue)));
        let models = Arc::new(ModelRegistry::with_defaults());
        let tracker = Arc::new(InMemoryTracker::new());
        let llm = Arc::new(llm);
        let orchestrator = Orchestrator::new(
            Arc::clone(&llm) as Arc<dyn CompletionClient>,
            delegator,
            queue,
            models,
            tracker,
        );

        orchestrator
            .process_user_request(Uuid::new_v4(), "portfolio_review", json!({}))
            .await
            .unwrap();

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Understand the user request"));
        assert!(prompts[1].contains("phased execution plan"));
        // The plan prompt is seeded with the understanding output.
        assert!(prompts[1].contains("concentration risk"));
    }
}
