//! Gemini `generateContent` connector, mirroring `minerva-llm-openai`
//! with Gemini's wire format (grounded on the teacher's
//! `connectors/gemini` crate).

pub mod config;

pub use config::GeminiConfig;

use async_trait::async_trait;
use minerva_llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;
        Ok(Self { config, http })
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: u32,
}

fn estimate_cost(prompt_tokens: u32, completion_tokens: u32) -> f64 {
    (prompt_tokens as f64 / 1000.0) * 0.000075 + (completion_tokens as f64 / 1000.0) * 0.0003
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = GenerateContentRequest {
            contents: vec![Content { parts: vec![Part { text: &request.prompt }] }],
            system_instruction: request
                .system_prompt
                .as_deref()
                .map(|s| Content { parts: vec![Part { text: s }] }),
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens.or(self.config.max_tokens),
                temperature: request.temperature.or(self.config.temperature),
            },
        };

        debug!(model = %self.config.model, "sending completion request to gemini");

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.api_base, self.config.model, self.config.api_key
        );
        let response = self.http.post(url).json(&body).send().await.map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited { retry_after_secs: None });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "gemini returned an error response");
            return Err(LlmError::Upstream(format!("status {status}: {body}")));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| LlmError::InvalidResponse("no candidates in response".to_string()))?;

        let (prompt_tokens, completion_tokens) = parsed
            .usage_metadata
            .map(|u| (u.prompt_token_count, u.candidates_token_count))
            .unwrap_or((0, 0));

        Ok(CompletionResponse {
            text,
            prompt_tokens,
            completion_tokens,
            estimated_cost_usd: estimate_cost(prompt_tokens, completion_tokens),
        })
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn parses_a_successful_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "hola"}]}}],
                "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 2}
            })))
            .mount(&server)
            .await;

        let config = GeminiConfig::new("test-key").with_api_base(server.uri());
        let client = GeminiClient::new(config).unwrap();
        let response = client.complete(CompletionRequest::new("hi")).await.unwrap();
        assert_eq!(response.text, "hola");
    }
}
