//! Completion service boundary
//!
//! The LLM call itself is an external collaborator: this module owns only the
//! request/response contract, an HTTP-backed client with connection pooling,
//! and a scripted mock for tests and the demo binary.

use crate::error::OrchestratorError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::env;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub model_id: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub completion: String,
    pub model_id: String,
    pub usage: TokenUsage,
    pub request_id: Uuid,
}

/// External completion collaborator.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}

//
// ================= HTTP Client =================
//

/// Reusable completion client (connection-pooled)
pub struct HttpCompletionClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    completion: String,
    model: String,
    usage: TokenUsage,
    request_id: Uuid,
}

impl HttpCompletionClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build from `COMPLETION_API_KEY` / `COMPLETION_API_BASE_URL`.
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("COMPLETION_API_KEY").ok()?;
        let base_url = env::var("COMPLETION_API_BASE_URL").ok()?;
        Some(Self::new(api_key, base_url))
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        if self.api_key.is_empty() {
            return Err(OrchestratorError::LlmError(
                "completion API key not configured".to_string(),
            ));
        }

        let url = format!("{}/v1/complete", self.base_url);
        let wire = WireRequest {
            model: &request.model_id,
            prompt: &request.prompt,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        info!(model = %request.model_id, "Calling completion API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&wire)
            .send()
            .await
            .map_err(|e| {
                error!("Completion API request failed: {}", e);
                OrchestratorError::LlmError(format!("completion API error: {}", e))
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Completion API error response: {}", error_text);
            return Err(OrchestratorError::LlmError(format!(
                "completion API error: {}",
                error_text
            )));
        }

        let wire: WireResponse = response.json().await.map_err(|e| {
            error!("Failed to parse completion response: {}", e);
            OrchestratorError::LlmError(format!("completion parse error: {}", e))
        })?;

        if wire.completion.is_empty() {
            return Err(OrchestratorError::LlmError(
                "empty completion from API".to_string(),
            ));
        }

        Ok(CompletionResponse {
            completion: wire.completion,
            model_id: wire.model,
            usage: wire.usage,
            request_id: wire.request_id,
        })
    }
}

//
// ================= Mock Client =================
//

/// Scripted completion client for development & testing.
/// Keeps the system functional without an LLM dependency.
pub struct MockCompletionClient {
    responses: Mutex<VecDeque<std::result::Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockCompletionClient {
    /// Returns the given completions in order; further calls fail.
    pub fn scripted(completions: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(
                completions.into_iter().map(|c| Ok(c.to_string())).collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call with the given message.
    pub fn failing(message: &str) -> Self {
        let mut responses = VecDeque::new();
        responses.push_back(Err(message.to_string()));
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts seen so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.prompt.clone());

        let next = {
            let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
            responses.pop_front()
        };

        match next {
            Some(Ok(completion)) => Ok(CompletionResponse {
                completion,
                model_id: request.model_id,
                usage: TokenUsage {
                    input_tokens: 120,
                    output_tokens: 80,
                    total_tokens: 200,
                },
                request_id: Uuid::new_v4(),
            }),
            Some(Err(message)) => Err(OrchestratorError::LlmError(message)),
            None => Err(OrchestratorError::LlmError(
                "mock completion script exhausted".to_string(),
            )),
        }
    }
}
