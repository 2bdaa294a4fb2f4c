//! OpenAI chat-completions connector, grounded on the teacher's
//! `connectors/openai` crate: reqwest client construction, prompt
//! building, response validation, and cost accounting.

pub mod config;

pub use config::OpenAiConfig;

use async_trait::async_trait;
use minerva_llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub struct OpenAiClient {
    config: OpenAiConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;
        Ok(Self { config, http })
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Per-1K-token USD pricing used for cost estimation; approximate, for
/// observability only, never used to make pipeline decisions.
fn estimate_cost(model: &str, prompt_tokens: u32, completion_tokens: u32) -> f64 {
    let (prompt_rate, completion_rate) = if model.contains("mini") {
        (0.00015, 0.0006)
    } else {
        (0.0025, 0.01)
    };
    (prompt_tokens as f64 / 1000.0) * prompt_rate + (completion_tokens as f64 / 1000.0) * completion_rate
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage { role: "system", content: system });
        }
        messages.push(ChatMessage { role: "user", content: &request.prompt });

        let body = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: request.max_tokens.or(self.config.max_tokens),
            temperature: request.temperature.or(self.config.temperature),
        };

        debug!(model = %self.config.model, "sending completion request to openai");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(LlmError::RateLimited { retry_after_secs: retry_after });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "openai returned an error response");
            return Err(LlmError::Upstream(format!("status {status}: {body}")));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

        let (prompt_tokens, completion_tokens) = parsed
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(CompletionResponse {
            text,
            prompt_tokens,
            completion_tokens,
            estimated_cost_usd: estimate_cost(&self.config.model, prompt_tokens, completion_tokens),
        })
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn parses_a_successful_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "hola"}}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 2}
            })))
            .mount(&server)
            .await;

        let config = OpenAiConfig::new("test-key").with_api_base(server.uri());
        let client = OpenAiClient::new(config).unwrap();
        let response = client.complete(CompletionRequest::new("hi")).await.unwrap();
        assert_eq!(response.text, "hola");
        assert_eq!(response.prompt_tokens, 10);
    }

    #[tokio::test]
    async fn maps_429_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let config = OpenAiConfig::new("test-key").with_api_base(server.uri());
        let client = OpenAiClient::new(config).unwrap();
        let err = client.complete(CompletionRequest::new("hi")).await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimited { .. }));
    }
}
