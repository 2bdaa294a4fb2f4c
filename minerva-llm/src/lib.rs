//! The `LlmClient` contract every connector crate implements, generalized
//! from the teacher's `LlmConnector` trait (`core/src/traits.rs`) down to
//! the single-completion surface this pipeline needs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// When set, the connector should ask the model for a JSON object
    /// conforming to this schema description (a prompt-level hint, not a
    /// hard API-enforced schema, since not every connector supports one).
    pub json_schema_hint: Option<String>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
            json_schema_hint: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_json_schema_hint(mut self, hint: impl Into<String>) -> Self {
        self.json_schema_hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub estimated_cost_usd: f64,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request to upstream LLM failed: {0}")]
    Request(String),

    #[error("upstream LLM returned an error: {0}")]
    Upstream(String),

    #[error("response could not be parsed: {0}")]
    InvalidResponse(String),

    #[error("rate limited by upstream, retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Request(_) | LlmError::RateLimited { .. })
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Human-readable identifier for logging ("openai:gpt-4o-mini").
    fn model_id(&self) -> &str;
}
