//! LLM API HTTP Client
//!
//! Supports OpenAI-compatible chat completions and the Anthropic messages API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::{Config, LlmProvider};
use crate::error::{Error, Result};

use super::provider::{CompletionProvider, ProviderMessage};
use super::types::*;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// HTTP completion provider
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    provider: LlmProvider,
    temperature: f32,
    max_tokens: u32,
}

impl LlmClient {
    /// Create a new client from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.llm.api_key.clone(),
            model: config.llm.model.clone(),
            base_url: config.base_url().trim_end_matches('/').to_string(),
            provider: config.llm.provider,
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        })
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the provider type
    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    async fn send_openai_request(&self, messages: &[ProviderMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Sending request to OpenAI-compatible API: {}", url);

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let body = read_body(response).await?;

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Upstream(format!("Failed to parse response: {} - {}", e, body)))?;

        let text = parsed
            .first_text()
            .ok_or_else(|| Error::Upstream("Provider returned no candidates".to_string()))?;

        info!(
            "OpenAI API response: finish_reason={:?}, tokens={}",
            parsed.choices.first().and_then(|c| c.finish_reason.as_deref()),
            parsed.usage().map(|u| u.output_tokens).unwrap_or(0)
        );

        Ok(text)
    }

    async fn send_claude_request(&self, messages: &[ProviderMessage]) -> Result<String> {
        let url = format!("{}/messages", self.base_url);
        debug!("Sending request to Claude API: {}", url);

        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: messages.iter().map(ChatMessage::from).collect(),
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;
        let body = read_body(response).await?;

        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Upstream(format!("Failed to parse response: {} - {}", e, body)))?;

        let text = parsed
            .text()
            .ok_or_else(|| Error::Upstream("Provider returned no text content".to_string()))?;

        info!(
            "Claude API response: stop_reason={:?}, tokens={}",
            parsed.stop_reason,
            parsed.usage.map(|u| u.output_tokens).unwrap_or(0)
        );

        Ok(text)
    }
}

/// Read a response body, turning non-2xx statuses into upstream errors
async fn read_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        warn!("Completion API error: {} - {}", status, body);
        return Err(Error::Upstream(format!("{}: {}", status, body)));
    }

    Ok(body)
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(&self, messages: &[ProviderMessage]) -> Result<String> {
        match self.provider {
            LlmProvider::OpenAi => self.send_openai_request(messages).await,
            LlmProvider::Claude => self.send_claude_request(messages).await,
        }
    }
}
