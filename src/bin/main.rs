use multi_agent_orchestrator::{
    delegation::TaskDelegator,
    llm::MockCompletionClient,
    orchestrator::Orchestrator,
    queue::MessageQueue,
    registry::AgentRegistry,
    selection::ModelRegistry,
    tracking::InMemoryTracker,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const UNDERSTANDING_JSON: &str = r#"{
    "understanding": "Review a tech-heavy portfolio for concentration risk",
    "objectives": ["assess concentration risk", "propose rebalancing"],
    "analysisType": "portfolio_review",
    "constraints": ["no derivatives"],
    "deliverables": ["summary report"]
}"#;

const PLAN_JSON: &str = r#"{
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
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("Multi-Agent Orchestrator starting");

    // Create components
    let llm = Arc::new(MockCompletionClient::scripted(vec![
        UNDERSTANDING_JSON,
        PLAN_JSON,
    ]));
    let agents = Arc::new(AgentRegistry::with_defaults());
    let queue = Arc::new(MessageQueue::new());
    let delegator = Arc::new(TaskDelegator::new(Arc::clone(&agents), Arc::clone(&queue)));
    let models = Arc::new(ModelRegistry::with_defaults());
    let tracker = Arc::new(InMemoryTracker::new());

    let orchestrator = Orchestrator::new(
        llm,
        delegator,
        Arc::clone(&queue),
        Arc::clone(&models),
        tracker,
    );

    // Process a sample request
    let ctx = orchestrator
        .process_user_request(
            Uuid::new_v4(),
            "portfolio_review",
            serde_json::json!({
                "holdings": ["AAPL", "MSFT", "GOOGL"],
                "accuracy_requirement": "high"
            }),
        )
        .await?;

    println!("\n=== CONVERSATION ===");
    println!("ID: {}", ctx.id);
    println!("Phase: {}", ctx.current_phase);
    println!("Tasks:");
    for task in &ctx.tasks {
        println!("  [{}] {} -> {}", task.status, task.description, task.agent_role);
    }

    // Delegate the whole plan
    for task in &ctx.tasks {
        let outcome = orchestrator.delegate_task(ctx.id, task.id).await?;
        match outcome.error {
            None => println!(
                "Delegated '{}' to {}",
                task.description,
                outcome
                    .assigned_to
                    .map(|a| a.to_string())
                    .unwrap_or_default()
            ),
            Some(error) => println!("Delegation of '{}' rejected: {}", task.description, error),
        }
    }

    // Let the simulated agents run for a moment
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;

    let refreshed = orchestrator
        .get_conversation_context(ctx.id)
        .await
        .expect("conversation still stored");

    println!("\n=== TASK BOARD ===");
    for task in &refreshed.tasks {
        println!("  [{}] {}", task.status, task.description);
    }

    println!("\n=== MESSAGES ===");
    for message in queue.drain() {
        println!(
            "  {} -> {} ({:?}): {}",
            message.sender, message.recipient, message.message_type, message.content
        );
    }

    println!("\n=== MODEL HEALTH ===");
    for model_id in ["claude-sonnet-3.7", "gemini-2.0-flash", "quant-analyst-xl"] {
        let health = models.model_health(model_id).await;
        println!("  {}: {:?}", model_id, health.status);
    }

    Ok(())
}
