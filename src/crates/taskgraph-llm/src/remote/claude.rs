//! Anthropic Claude client implementation (Messages API).
//!
//! # Example
//!
//! ```rust,ignore
//! use taskgraph_llm::config::RemoteLlmConfig;
//! use taskgraph_llm::remote::ClaudeClient;
//! use taskgraph_core::llm::LlmClient;
//!
//! let config = RemoteLlmConfig::from_env(
//!     "ANTHROPIC_API_KEY",
//!     "https://api.anthropic.com",
//!     "claude-3-sonnet-20240229",
//! )?;
//! let client = ClaudeClient::new(config);
//! let answer = client.invoke("Explain quantum computing briefly").await?;
//! ```

use crate::config::RemoteLlmConfig;
use crate::error::LlmError;
use crate::remote::sse;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use taskgraph_core::error::EngineError;
use taskgraph_core::llm::{Chunk, LlmClient};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: usize = 4096;

/// Anthropic Messages API client.
#[derive(Clone)]
pub struct ClaudeClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl ClaudeClient {
    pub fn new(config: RemoteLlmConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { config, client }
    }

    fn request(&self, prompt: &str, stream: bool) -> reqwest::RequestBuilder {
        let url = format!("{}/v1/messages", self.config.base_url);
        let body = ClaudeRequest {
            model: self.config.model.clone(),
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.0,
            stream,
        };

        self.client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(match status.as_u16() {
            401 => LlmError::AuthenticationError(body),
            429 => LlmError::RateLimitExceeded(body),
            _ => LlmError::ProviderError(format!("Claude API error {status}: {body}")),
        })
    }
}

#[async_trait]
impl LlmClient for ClaudeClient {
    async fn invoke(&self, prompt: &str) -> Result<String, EngineError> {
        let response = self.request(prompt, false).send().await.map_err(LlmError::HttpError)?;
        let response = Self::check_status(response).await?;
        let parsed: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let content = parsed
            .content
            .into_iter()
            .filter_map(|block| (block.block_type == "text").then_some(block.text).flatten())
            .collect::<Vec<_>>()
            .join("");
        Ok(content)
    }

    async fn stream(
        &self,
        prompt: &str,
    ) -> Result<BoxStream<'static, Result<Chunk, EngineError>>, EngineError> {
        let response = self.request(prompt, true).send().await.map_err(LlmError::HttpError)?;
        let response = Self::check_status(response).await?;

        let chunks = sse::data_lines(response).filter_map(|payload| async move {
            let payload = match payload {
                Ok(p) => p,
                Err(e) => return Some(Err(EngineError::from(e))),
            };
            match serde_json::from_str::<ClaudeStreamEvent>(&payload) {
                Ok(ClaudeStreamEvent::ContentBlockDelta { delta }) if !delta.text.is_empty() => {
                    Some(Ok(Chunk { content: delta.text }))
                }
                Ok(_) => None,
                Err(e) => Some(Err(EngineError::from(LlmError::SerializationError(
                    e.to_string(),
                )))),
            }
        });

        Ok(Box::pin(chunks))
    }
}

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    messages: Vec<ClaudeMessage>,
    max_tokens: usize,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Debug, Deserialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

/// Subset of Claude's streaming event envelope; any event type not named
/// here parses as `Unknown` and is ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClaudeStreamEvent {
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { delta: ClaudeDelta },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ClaudeDelta {
    #[serde(default)]
    text: String,
}
