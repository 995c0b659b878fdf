//! Language-model inference client
//!
//! Single-turn prompt/response exchanges against an OpenAI-compatible
//! chat-completions endpoint.

use crate::error::UpstreamError;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const SERVICE: &str = "language model";

/// Why a prompt is being sent. Drives logging and lets fakes script replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptRole {
    /// Source text in, structured findings out
    Audit,
    /// ABI in, fuzz-test source out
    TestGeneration,
    /// Failure log in, plain-language explanation out
    FailureInterpretation,
}

impl PromptRole {
    pub fn name(&self) -> &'static str {
        match self {
            PromptRole::Audit => "audit",
            PromptRole::TestGeneration => "test_generation",
            PromptRole::FailureInterpretation => "failure_interpretation",
        }
    }
}

impl std::fmt::Display for PromptRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One prompt to the inference service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub role: PromptRole,
    pub prompt: String,
}

impl PromptRequest {
    pub fn new(role: PromptRole, prompt: impl Into<String>) -> Self {
        Self {
            role,
            prompt: prompt.into(),
        }
    }
}

/// Single-turn text completion.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send one prompt and return the raw response text.
    async fn complete(&self, request: PromptRequest) -> Result<String>;

    /// Model identifier for log lines.
    fn model_name(&self) -> &str;
}

/// Inference service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Chat-completions endpoint
    pub base_url: String,
    /// Bearer token
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            base_url: std::env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),
            api_key: std::env::var("LLM_API_KEY").unwrap_or_default(),
            model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            temperature: std::env::var("LLM_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.2),
            request_timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),
        }
    }
}

impl LlmConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific endpoint and model
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        LlmConfig {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature: 0.2,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<Choice>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint
pub struct LlmClient {
    config: LlmConfig,
    http_client: reqwest::Client,
}

impl LlmClient {
    /// Create a new inference client
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("contract-sentinel/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(LlmClient {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn complete(&self, request: PromptRequest) -> Result<String> {
        debug!(role = %request.role, chars = request.prompt.len(), "sending prompt");

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: self.config.temperature,
        };

        let response = self
            .http_client
            .post(&self.config.base_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| UpstreamError::Decode {
            service: SERVICE,
            reason: e.to_string(),
        })?;

        if let Some(error) = parsed.error {
            return Err(UpstreamError::Api(error.message));
        }

        let content = parsed
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(UpstreamError::EmptyCompletion)?;

        info!(role = %request.role, model = %self.config.model, chars = content.len(), "received completion");
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
