//! Anthropic messages-API connector, mirroring
//! `minerva-llm-openai` with Anthropic's wire format (grounded on the
//! teacher's `connectors/anthropic` crate).

pub mod config;

pub use config::AnthropicConfig;

use async_trait::async_trait;
use minerva_llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub struct AnthropicClient {
    config: AnthropicConfig,
    http: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;
        Ok(Self { config, http })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

fn estimate_cost(prompt_tokens: u32, completion_tokens: u32) -> f64 {
    (prompt_tokens as f64 / 1000.0) * 0.003 + (completion_tokens as f64 / 1000.0) * 0.015
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: request.max_tokens.or(self.config.max_tokens).unwrap_or(4096),
            system: request.system_prompt.as_deref(),
            messages: vec![Message { role: "user", content: &request.prompt }],
            temperature: request.temperature.or(self.config.temperature),
        };

        debug!(model = %self.config.model, "sending completion request to anthropic");

        let response = self
            .http
            .post(format!("{}/v1/messages", self.config.api_base))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited { retry_after_secs: None });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "anthropic returned an error response");
            return Err(LlmError::Upstream(format!("status {status}: {body}")));
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let text = parsed
            .content
            .into_iter()
            .next()
            .map(|b| b.text)
            .ok_or_else(|| LlmError::InvalidResponse("no content blocks in response".to_string()))?;

        Ok(CompletionResponse {
            text,
            prompt_tokens: parsed.usage.input_tokens,
            completion_tokens: parsed.usage.output_tokens,
            estimated_cost_usd: estimate_cost(parsed.usage.input_tokens, parsed.usage.output_tokens),
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
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"text": "hola"}],
                "usage": {"input_tokens": 10, "output_tokens": 2}
            })))
            .mount(&server)
            .await;

        let config = AnthropicConfig::new("test-key").with_api_base(server.uri());
        let client = AnthropicClient::new(config).unwrap();
        let response = client.complete(CompletionRequest::new("hi")).await.unwrap();
        assert_eq!(response.text, "hola");
    }
}
