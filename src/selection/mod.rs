//! Model registry and selection engine
//!
//! Holds model definitions, a bounded rolling performance history per model,
//! rule-based selection over (agent role, task type, complexity), and the
//! fallback chain walk. Selection and fallback never fail: every path
//! degrades to the configured default model.

mod health;

use crate::models::{
    AgentTask, AgentType, ConversationContext, ModelDefinition, ModelHealth,
    ModelSelectionConfig, PerformanceMetrics, PerformanceObservation, TaskComplexity,
    TaskType,
};
use chrono::Utc;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Observations retained per model.
const HISTORY_WINDOW: usize = 50;

/// Capability string that unlocks the deep-analysis configuration extras.
const ANALYSIS_DEPTH_CAPABILITY: &str = "analysis-depth";

//
// ================= Selection Output =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfiguration {
    pub temperature: f64,
    pub max_tokens: u32,
    #[serde(default)]
    pub extras: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedModel {
    pub model_id: String,
    pub configuration: ModelConfiguration,
}

/// Value-level result of a runtime model registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    pub success: bool,
    pub model_id: Option<String>,
    pub error: Option<String>,
}

impl RegistrationOutcome {
    fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            model_id: None,
            error: Some(error.into()),
        }
    }
}

//
// ================= Selection Rules =================
//

/// One row of the static capability table. `None` fields are wildcards.
struct SelectionRule {
    role: Option<AgentType>,
    task_type: Option<TaskType>,
    complexity: Option<TaskComplexity>,
    model_id: &'static str,
    reliability: f64,
}

impl SelectionRule {
    fn matches(&self, role: AgentType, task_type: TaskType, complexity: TaskComplexity) -> bool {
        self.role.map_or(true, |r| r == role)
            && self.task_type.map_or(true, |t| t == task_type)
            && self.complexity.map_or(true, |c| c == complexity)
    }

    fn specificity(&self) -> usize {
        [self.role.is_some(), self.task_type.is_some(), self.complexity.is_some()]
            .iter()
            .filter(|b| **b)
            .count()
    }
}

lazy_static! {
    static ref SELECTION_RULES: Vec<SelectionRule> = vec![
        SelectionRule {
            role: Some(AgentType::Analysis),
            task_type: Some(TaskType::DataAnalysis),
            complexity: Some(TaskComplexity::Complex),
            model_id: "quant-analyst-xl",
            reliability: 0.97,
        },
        SelectionRule {
            role: Some(AgentType::Analysis),
            task_type: None,
            complexity: None,
            model_id: "quant-analyst-xl",
            reliability: 0.93,
        },
        SelectionRule {
            role: Some(AgentType::Research),
            task_type: None,
            complexity: Some(TaskComplexity::Simple),
            model_id: "claude-haiku-3.5",
            reliability: 0.90,
        },
        SelectionRule {
            role: Some(AgentType::Research),
            task_type: None,
            complexity: None,
            model_id: "gemini-2.0-flash",
            reliability: 0.91,
        },
        SelectionRule {
            role: Some(AgentType::Compliance),
            task_type: None,
            complexity: None,
            model_id: "claude-sonnet-3.7",
            reliability: 0.99,
        },
        SelectionRule {
            role: Some(AgentType::Synthesis),
            task_type: None,
            complexity: None,
            model_id: "claude-sonnet-3.7",
            reliability: 0.96,
        },
        SelectionRule {
            role: Some(AgentType::Planning),
            task_type: None,
            complexity: None,
            model_id: "claude-sonnet-3.7",
            reliability: 0.95,
        },
    ];
}

fn builtin_models() -> Vec<ModelDefinition> {
    vec![
        ModelDefinition {
            id: "claude-sonnet-3.7".to_string(),
            name: "Claude Sonnet".to_string(),
            version: "3.7".to_string(),
            provider: "anthropic".to_string(),
            capabilities: vec![
                "reasoning".to_string(),
                "compliance-review".to_string(),
                "synthesis".to_string(),
                "planning".to_string(),
            ],
            limitations: vec!["no-image-generation".to_string()],
            configuration_schema: serde_json::json!({
                "temperature": "number",
                "max_tokens": "integer"
            }),
        },
        ModelDefinition {
            id: "claude-haiku-3.5".to_string(),
            name: "Claude Haiku".to_string(),
            version: "3.5".to_string(),
            provider: "anthropic".to_string(),
            capabilities: vec!["summarization".to_string(), "fast-lookup".to_string()],
            limitations: vec!["shallow-reasoning".to_string()],
            configuration_schema: serde_json::json!({
                "temperature": "number",
                "max_tokens": "integer"
            }),
        },
        ModelDefinition {
            id: "gemini-2.0-flash".to_string(),
            name: "Gemini Flash".to_string(),
            version: "2.0".to_string(),
            provider: "google".to_string(),
            capabilities: vec!["market-research".to_string(), "news".to_string()],
            limitations: vec![],
            configuration_schema: serde_json::json!({
                "temperature": "number",
                "max_output_tokens": "integer"
            }),
        },
        ModelDefinition {
            id: "quant-analyst-xl".to_string(),
            name: "Quant Analyst XL".to_string(),
            version: "1.2".to_string(),
            provider: "internal".to_string(),
            capabilities: vec![
                ANALYSIS_DEPTH_CAPABILITY.to_string(),
                "financial-modeling".to_string(),
                "data-analysis".to_string(),
            ],
            limitations: vec!["domain-specific".to_string()],
            configuration_schema: serde_json::json!({
                "temperature": "number",
                "max_tokens": "integer",
                "analysis_depth": "string"
            }),
        },
    ]
}

//
// ================= Registry =================
//

pub struct ModelRegistry {
    config: ModelSelectionConfig,
    definitions: RwLock<HashMap<String, ModelDefinition>>,
    history: RwLock<HashMap<String, VecDeque<PerformanceObservation>>>,
}

impl ModelRegistry {
    /// Registry seeded with the built-in model definitions.
    pub fn new(config: ModelSelectionConfig) -> Self {
        let definitions = builtin_models()
            .into_iter()
            .map(|def| (def.id.clone(), def))
            .collect();

        Self {
            config,
            definitions: RwLock::new(definitions),
            history: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ModelSelectionConfig::default())
    }

    pub fn config(&self) -> &ModelSelectionConfig {
        &self.config
    }

    pub async fn definition(&self, model_id: &str) -> Option<ModelDefinition> {
        let definitions = self.definitions.read().await;
        definitions.get(model_id).cloned()
    }

    pub async fn is_registered(&self, model_id: &str) -> bool {
        let definitions = self.definitions.read().await;
        definitions.contains_key(model_id)
    }

    //
    // ================= Selection =================
    //

    /// Rule-based selection for a concrete task within a conversation.
    pub async fn select_model(
        &self,
        task: &AgentTask,
        context: &ConversationContext,
    ) -> SelectedModel {
        self.select_for(
            task.agent_role,
            task.task_type,
            task.complexity,
            &task.domain,
            accuracy_requirement(context),
        )
        .await
    }

    /// Selection without a materialized task, used for the orchestrator's own
    /// understanding/planning calls.
    pub async fn select_for_role(
        &self,
        role: AgentType,
        task_type: TaskType,
        complexity: TaskComplexity,
        context: &ConversationContext,
    ) -> SelectedModel {
        self.select_for(role, task_type, complexity, "general", accuracy_requirement(context))
            .await
    }

    async fn select_for(
        &self,
        role: AgentType,
        task_type: TaskType,
        complexity: TaskComplexity,
        domain: &str,
        accuracy_requirement: Option<String>,
    ) -> SelectedModel {
        let mut best: Option<(&SelectionRule, usize)> = None;
        for rule in SELECTION_RULES.iter() {
            if !rule.matches(role, task_type, complexity) {
                continue;
            }
            let specificity = rule.specificity();
            match best {
                None => best = Some((rule, specificity)),
                Some((current, current_specificity)) => {
                    // Most specific rule wins; equal specificity falls back
                    // to the higher registered reliability.
                    if specificity > current_specificity
                        || (specificity == current_specificity
                            && rule.reliability > current.reliability)
                    {
                        best = Some((rule, specificity));
                    }
                }
            }
        }

        let candidate = best
            .map(|(rule, _)| rule.model_id.to_string())
            .unwrap_or_else(|| self.config.default_model.clone());

        let model_id = if self.is_registered(&candidate).await {
            candidate
        } else {
            debug!(model = %candidate, "Selected model not registered, using default");
            self.config.default_model.clone()
        };

        self.configured(&model_id, domain, complexity, accuracy_requirement.as_deref())
            .await
    }

    /// Configuration generation: a pure function of the task shape, the
    /// conversation's accuracy requirement, and the chosen model.
    async fn configured(
        &self,
        model_id: &str,
        domain: &str,
        complexity: TaskComplexity,
        accuracy_requirement: Option<&str>,
    ) -> SelectedModel {
        let mut configuration = ModelConfiguration {
            temperature: 0.3,
            max_tokens: 1_024,
            extras: HashMap::new(),
        };

        if accuracy_requirement == Some("high") {
            configuration.temperature = 0.1;
        }
        if complexity == TaskComplexity::Complex {
            configuration.max_tokens = configuration.max_tokens.max(4_096);
        }

        if let Some(def) = self.definition(model_id).await {
            let deep_capable = def
                .capabilities
                .iter()
                .any(|c| c == ANALYSIS_DEPTH_CAPABILITY);
            if deep_capable && domain == "financial" && complexity == TaskComplexity::Complex {
                configuration.extras.insert(
                    "analysis_depth".to_string(),
                    serde_json::Value::String("comprehensive".to_string()),
                );
                configuration
                    .extras
                    .insert("financial_focus".to_string(), serde_json::Value::Bool(true));
            }
        }

        SelectedModel {
            model_id: model_id.to_string(),
            configuration,
        }
    }

    //
    // ================= Performance & Health =================
    //

    /// Append an observation to the model's bounded rolling history.
    pub async fn record_performance(
        &self,
        model_id: &str,
        metrics: PerformanceMetrics,
        success: bool,
    ) {
        let mut history = self.history.write().await;
        let window = history.entry(model_id.to_string()).or_default();
        window.push_back(PerformanceObservation {
            metrics,
            success,
            timestamp: Utc::now(),
        });
        while window.len() > HISTORY_WINDOW {
            window.pop_front();
        }
    }

    /// Most recent observation for the model, or the baseline defaults when
    /// nothing has been recorded.
    pub async fn evaluate_performance(&self, model_id: &str) -> PerformanceMetrics {
        let history = self.history.read().await;
        history
            .get(model_id)
            .and_then(|window| window.back())
            .map(|obs| obs.metrics.clone())
            .unwrap_or_default()
    }

    /// Point-in-time health from the full rolling window. No recorded data is
    /// not evidence of failure: an empty history classifies as healthy.
    pub async fn model_health(&self, model_id: &str) -> ModelHealth {
        let history = self.history.read().await;
        let window: Vec<PerformanceObservation> = history
            .get(model_id)
            .map(|w| w.iter().cloned().collect())
            .unwrap_or_default();
        drop(history);

        if window.is_empty() {
            return ModelHealth {
                status: crate::models::HealthStatus::Healthy,
                metrics: PerformanceMetrics::default(),
                issues: Vec::new(),
            };
        }

        let aggregate = health::aggregate(&window);
        let (status, issues) =
            health::classify(&aggregate, &self.config.performance_thresholds);

        ModelHealth {
            status,
            metrics: aggregate,
            issues,
        }
    }

    //
    // ================= Fallback =================
    //

    /// Walk the fallback chain, skipping the failed id and anything
    /// unregistered. Never returns the failed model, never errors: an
    /// exhausted or fully-invalid chain degrades to the default model.
    pub async fn fallback_model(
        &self,
        failed_model_id: &str,
        task: &AgentTask,
        context: &ConversationContext,
    ) -> SelectedModel {
        let requirement = accuracy_requirement(context);

        for candidate in &self.config.fallback_chain {
            if candidate == failed_model_id {
                continue;
            }
            if self.is_registered(candidate).await {
                debug!(failed = %failed_model_id, fallback = %candidate, "Fallback model chosen");
                return self
                    .configured(candidate, &task.domain, task.complexity, requirement.as_deref())
                    .await;
            }
        }

        if self.config.default_model != failed_model_id {
            return self
                .configured(
                    &self.config.default_model,
                    &task.domain,
                    task.complexity,
                    requirement.as_deref(),
                )
                .await;
        }

        // The default itself failed; pick any other registered model.
        let alternative = {
            let definitions = self.definitions.read().await;
            let mut ids: Vec<&String> = definitions
                .keys()
                .filter(|id| id.as_str() != failed_model_id)
                .collect();
            ids.sort();
            ids.first().map(|id| (*id).clone())
        };

        match alternative {
            Some(id) => {
                self.configured(&id, &task.domain, task.complexity, requirement.as_deref())
                    .await
            }
            None => {
                warn!(
                    failed = %failed_model_id,
                    "No alternative to failed default model; returning it anyway"
                );
                self.configured(
                    &self.config.default_model,
                    &task.domain,
                    task.complexity,
                    requirement.as_deref(),
                )
                .await
            }
        }
    }

    //
    // ================= Registration =================
    //

    /// Runtime registration of a custom model. Validation failures and
    /// duplicate ids are value-level rejections, never errors.
    pub async fn register_custom_model(&self, definition: ModelDefinition) -> RegistrationOutcome {
        let required = [
            ("id", &definition.id),
            ("name", &definition.name),
            ("version", &definition.version),
            ("provider", &definition.provider),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return RegistrationOutcome::rejected(format!("{} required", field));
            }
        }
        if definition.configuration_schema.is_null() {
            return RegistrationOutcome::rejected("configuration_schema required");
        }

        let mut definitions = self.definitions.write().await;
        if definitions.contains_key(&definition.id) {
            return RegistrationOutcome::rejected(format!(
                "model '{}' already exists",
                definition.id
            ));
        }

        let model_id = definition.id.clone();
        definitions.insert(model_id.clone(), definition);

        RegistrationOutcome {
            success: true,
            model_id: Some(model_id),
            error: None,
        }
    }
}

fn accuracy_requirement(context: &ConversationContext) -> Option<String> {
    context
        .parameters
        .get("accuracy_requirement")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskPriority;
    use serde_json::json;
    use uuid::Uuid;

    fn context(parameters: serde_json::Value) -> ConversationContext {
        ConversationContext::new(Uuid::new_v4(), "portfolio_review", parameters)
    }

    fn task(
        role: AgentType,
        task_type: TaskType,
        complexity: TaskComplexity,
        domain: &str,
    ) -> AgentTask {
        AgentTask::new(
            Uuid::new_v4(),
            task_type,
            complexity,
            domain,
            TaskPriority::Medium,
            role,
            "test task",
            json!({}),
        )
    }

    #[tokio::test]
    async fn test_rule_match_prefers_specificity() {
        let registry = ModelRegistry::with_defaults();
        let ctx = context(json!({}));

        let deep = registry
            .select_model(
                &task(AgentType::Analysis, TaskType::DataAnalysis, TaskComplexity::Complex, "financial"),
                &ctx,
            )
            .await;
        assert_eq!(deep.model_id, "quant-analyst-xl");

        let research = registry
            .select_model(
                &task(AgentType::Research, TaskType::MarketResearch, TaskComplexity::Medium, "financial"),
                &ctx,
            )
            .await;
        assert_eq!(research.model_id, "gemini-2.0-flash");
    }

    #[tokio::test]
    async fn test_high_accuracy_clamps_temperature() {
        let registry = ModelRegistry::with_defaults();
        let ctx = context(json!({ "accuracy_requirement": "high" }));

        for role in AgentType::ALL {
            let selected = registry
                .select_model(
                    &task(role, TaskType::DataAnalysis, TaskComplexity::Medium, "financial"),
                    &ctx,
                )
                .await;
            assert!(
                selected.configuration.temperature <= 0.1,
                "role {:?} got temperature {}",
                role,
                selected.configuration.temperature
            );
        }
    }

    #[tokio::test]
    async fn test_complex_tasks_raise_max_tokens() {
        let registry = ModelRegistry::with_defaults();
        let ctx = context(json!({}));
        let selected = registry
            .select_model(
                &task(AgentType::Synthesis, TaskType::ReportSynthesis, TaskComplexity::Complex, "financial"),
                &ctx,
            )
            .await;
        assert!(selected.configuration.max_tokens >= 4_096);
    }

    #[tokio::test]
    async fn test_deep_analysis_extras() {
        let registry = ModelRegistry::with_defaults();
        let ctx = context(json!({}));
        let selected = registry
            .select_model(
                &task(AgentType::Analysis, TaskType::DataAnalysis, TaskComplexity::Complex, "financial"),
                &ctx,
            )
            .await;

        assert_eq!(
            selected.configuration.extras.get("analysis_depth"),
            Some(&json!("comprehensive"))
        );
        assert_eq!(
            selected.configuration.extras.get("financial_focus"),
            Some(&json!(true))
        );

        // Same model, non-financial domain: no extras.
        let plain = registry
            .select_model(
                &task(AgentType::Analysis, TaskType::DataAnalysis, TaskComplexity::Complex, "energy"),
                &ctx,
            )
            .await;
        assert!(plain.configuration.extras.is_empty());
    }

    #[tokio::test]
    async fn test_compliance_routes_to_default_model() {
        let registry = ModelRegistry::with_defaults();
        let ctx = context(json!({}));
        let selected = registry
            .select_model(
                &task(AgentType::Compliance, TaskType::ComplianceReview, TaskComplexity::Simple, "financial"),
                &ctx,
            )
            .await;
        assert_eq!(selected.model_id, "claude-sonnet-3.7");
    }

    #[tokio::test]
    async fn test_rolling_history_is_bounded() {
        let registry = ModelRegistry::with_defaults();
        for i in 0..60 {
            registry
                .record_performance(
                    "claude-sonnet-3.7",
                    PerformanceMetrics {
                        accuracy: i as f64 / 100.0,
                        ..Default::default()
                    },
                    true,
                )
                .await;
        }

        let history = registry.history.read().await;
        assert_eq!(history.get("claude-sonnet-3.7").unwrap().len(), HISTORY_WINDOW);
    }

    #[tokio::test]
    async fn test_evaluate_returns_latest_or_default() {
        let registry = ModelRegistry::with_defaults();

        let baseline = registry.evaluate_performance("claude-sonnet-3.7").await;
        assert!((baseline.accuracy - 0.85).abs() < f64::EPSILON);

        registry
            .record_performance(
                "claude-sonnet-3.7",
                PerformanceMetrics {
                    accuracy: 0.71,
                    ..Default::default()
                },
                true,
            )
            .await;
        let latest = registry.evaluate_performance("claude-sonnet-3.7").await;
        assert!((latest.accuracy - 0.71).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_health_mean_accuracy() {
        let registry = ModelRegistry::with_defaults();
        for accuracy in [0.90, 0.88] {
            registry
                .record_performance(
                    "gemini-2.0-flash",
                    PerformanceMetrics {
                        accuracy,
                        latency_ms: 800.0,
                        error_rate: 0.01,
                        ..Default::default()
                    },
                    true,
                )
                .await;
        }

        let health = registry.model_health("gemini-2.0-flash").await;
        assert!((health.metrics.accuracy - 0.89).abs() < 0.01);
        assert_eq!(health.status, crate::models::HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_empty_history_is_healthy() {
        let registry = ModelRegistry::with_defaults();
        let health = registry.model_health("never-used").await;
        assert_eq!(health.status, crate::models::HealthStatus::Healthy);
        assert!(health.issues.is_empty());
    }

    #[tokio::test]
    async fn test_error_rate_breach_is_unhealthy_regardless() {
        let registry = ModelRegistry::with_defaults();
        registry
            .record_performance(
                "claude-haiku-3.5",
                PerformanceMetrics {
                    accuracy: 0.99,
                    latency_ms: 100.0,
                    error_rate: 0.5,
                    ..Default::default()
                },
                false,
            )
            .await;

        let health = registry.model_health("claude-haiku-3.5").await;
        assert_eq!(health.status, crate::models::HealthStatus::Unhealthy);
        assert!(health.issues.iter().any(|i| i.contains("error rate")));
    }

    #[tokio::test]
    async fn test_fallback_never_returns_failed_model() {
        let registry = ModelRegistry::with_defaults();
        let ctx = context(json!({}));
        let t = task(AgentType::Research, TaskType::MarketResearch, TaskComplexity::Medium, "financial");

        for failed in ["claude-sonnet-3.7", "gemini-2.0-flash", "quant-analyst-xl"] {
            let fallback = registry.fallback_model(failed, &t, &ctx).await;
            assert_ne!(fallback.model_id, failed);
        }
    }

    #[tokio::test]
    async fn test_fallback_with_invalid_chain_degrades_to_default() {
        let config = ModelSelectionConfig {
            fallback_chain: vec!["non-existent-model".to_string()],
            ..Default::default()
        };
        let registry = ModelRegistry::new(config);
        let ctx = context(json!({}));
        let t = task(AgentType::Research, TaskType::MarketResearch, TaskComplexity::Medium, "financial");

        // Failed model is not the default: chain is useless, default wins.
        let fallback = registry.fallback_model("quant-analyst-xl", &t, &ctx).await;
        assert_eq!(fallback.model_id, "claude-sonnet-3.7");

        // Failed model IS the default: some other registered model wins.
        let fallback = registry.fallback_model("claude-sonnet-3.7", &t, &ctx).await;
        assert_ne!(fallback.model_id, "claude-sonnet-3.7");
        assert!(registry.is_registered(&fallback.model_id).await);
    }

    #[tokio::test]
    async fn test_fallback_with_empty_chain_never_panics() {
        let config = ModelSelectionConfig {
            fallback_chain: Vec::new(),
            ..Default::default()
        };
        let registry = ModelRegistry::new(config);
        let ctx = context(json!({}));
        let t = task(AgentType::Planning, TaskType::Planning, TaskComplexity::Simple, "general");

        let fallback = registry.fallback_model("gemini-2.0-flash", &t, &ctx).await;
        assert_eq!(fallback.model_id, "claude-sonnet-3.7");
    }

    #[tokio::test]
    async fn test_register_custom_model() {
        let registry = ModelRegistry::with_defaults();
        let definition = ModelDefinition {
            id: "house-model-1".to_string(),
            name: "House Model".to_string(),
            version: "0.1".to_string(),
            provider: "internal".to_string(),
            capabilities: vec!["summarization".to_string()],
            limitations: vec![],
            configuration_schema: json!({ "temperature": "number" }),
        };

        let outcome = registry.register_custom_model(definition.clone()).await;
        assert!(outcome.success);
        assert_eq!(outcome.model_id.as_deref(), Some("house-model-1"));
        assert!(registry.is_registered("house-model-1").await);

        // Idempotent rejection: same id always fails, whatever the payload.
        let mut changed = definition;
        changed.name = "Renamed".to_string();
        let outcome = registry.register_custom_model(changed).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("already exists"));
    }

    #[tokio::test]
    async fn test_register_rejects_missing_fields() {
        let registry = ModelRegistry::with_defaults();
        let outcome = registry
            .register_custom_model(ModelDefinition {
                id: String::new(),
                name: "X".to_string(),
                version: "1".to_string(),
                provider: "p".to_string(),
                capabilities: vec![],
                limitations: vec![],
                configuration_schema: json!({}),
            })
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("id required"));

        let outcome = registry
            .register_custom_model(ModelDefinition {
                id: "y".to_string(),
                name: "Y".to_string(),
                version: "1".to_string(),
                provider: "p".to_string(),
                capabilities: vec![],
                limitations: vec![],
                configuration_schema: serde_json::Value::Null,
            })
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("configuration_schema required"));
    }
}
