use multi_agent_orchestrator::{
    api::{start_server, ApiState},
    delegation::TaskDelegator,
    llm::HttpCompletionClient,
    orchestrator::Orchestrator,
    queue::MessageQueue,
    registry::AgentRegistry,
    selection::ModelRegistry,
    tracking,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let llm = HttpCompletionClient::from_env().unwrap_or_else(|| {
        eprintln!("COMPLETION_API_KEY / COMPLETION_API_BASE_URL not set in .env");
        eprintln!("Requests will fail until the completion service is configured");
        HttpCompletionClient::new(String::new(), "http://localhost:9000".to_string())
    });

    let api_port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("Multi-Agent Orchestrator - API Server");
    info!("Port: {}", api_port);

    // Create components
    let agents = Arc::new(AgentRegistry::with_defaults());
    let queue = Arc::new(MessageQueue::new());
    let delegator = Arc::new(TaskDelegator::new(Arc::clone(&agents), Arc::clone(&queue)));
    let models = Arc::new(ModelRegistry::with_defaults());
    let tracker = tracking::tracker_from_env();

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(llm),
        delegator,
        queue,
        Arc::clone(&models),
        tracker,
    ));

    info!("Orchestrator initialized");

    let state = ApiState {
        orchestrator,
        agents,
        models,
    };

    start_server(state, api_port).await?;

    Ok(())
}
