use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub mod types;

use crate::config::{Provider, ReasoningConfig};
use crate::errors::ApiError;
use types::*;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Trait abstraction over the external reasoning service, enabling test mocking.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one system + user exchange and return the assistant's raw text.
    async fn complete(&self, system: &str, prompt: &str) -> std::result::Result<String, ApiError>;
}

pub struct ApiClient {
    client: Client,
    config: ReasoningConfig,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ReasoningConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            config: config.clone(),
        })
    }

    pub fn provider(&self) -> Provider {
        self.config.provider
    }

    fn api_key(&self) -> std::result::Result<&str, ApiError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ApiError::MissingCredentials)
    }

    async fn complete_openai(
        &self,
        system: &str,
        prompt: &str,
    ) -> std::result::Result<String, ApiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![Message::system(system), Message::user(prompt)],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!("Sending request to {}", url);
        let request = self
            .client
            .post(&url)
            .bearer_auth(self.api_key()?)
            .json(&body);
        let text = self.send(request).await?;

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))?;
        parsed
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| ApiError::Parse("response has no choices".to_string()))
    }

    async fn complete_anthropic(
        &self,
        system: &str,
        prompt: &str,
    ) -> std::result::Result<String, ApiError> {
        let url = format!("{}/messages", self.base_url);
        let body = MessagesRequest {
            model: self.config.model.clone(),
            system: system.to_string(),
            messages: vec![Message::user(prompt)],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!("Sending request to {}", url);
        let request = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key()?)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let text = self.send(request).await?;

        let parsed: MessagesResponse =
            serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))?;
        parsed
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| ApiError::Parse("response has no text content".to_string()))
    }

    /// Single attempt; a failed call is handled by the caller's fallback.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<String, ApiError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    seconds: self.config.timeout_secs,
                }
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        debug!("API response body ({} chars)", body_text.len());

        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                message: body_text.chars().take(500).collect(),
            });
        }
        Ok(body_text)
    }
}

#[async_trait]
impl LlmClient for ApiClient {
    async fn complete(&self, system: &str, prompt: &str) -> std::result::Result<String, ApiError> {
        let call = async {
            match self.config.provider {
                Provider::OpenAi => self.complete_openai(system, prompt).await,
                Provider::Anthropic => self.complete_anthropic(system, prompt).await,
            }
        };
        let limit = Duration::from_secs(self.config.timeout_secs.max(1));
        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| ApiError::Timeout {
                seconds: self.config.timeout_secs,
            })?
    }
}
