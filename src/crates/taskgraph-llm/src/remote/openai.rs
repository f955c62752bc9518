//! OpenAI-compatible client implementation.
//!
//! Targets the `/chat/completions` endpoint shared by OpenAI and most
//! OpenAI-compatible providers (self-hosted gateways, etc.), configured
//! via `base_url`.
//!
//! # Example
//!
//! ```rust,ignore
//! use taskgraph_llm::config::RemoteLlmConfig;
//! use taskgraph_llm::remote::OpenAiClient;
//! use taskgraph_core::llm::LlmClient;
//!
//! let config = RemoteLlmConfig::from_env(
//!     "OPENAI_API_KEY",
//!     "https://api.openai.com/v1",
//!     "gpt-4",
//! )?;
//! let client = OpenAiClient::new(config);
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

/// OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl OpenAiClient {
    pub fn new(config: RemoteLlmConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { config, client }
    }

    fn request(&self, prompt: &str, stream: bool) -> reqwest::RequestBuilder {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = OpenAiRequest {
            model: self.config.model.clone(),
            messages: vec![OpenAiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.0,
            stream,
        };

        let mut req = self.client.post(&url).json(&body);
        req = req.header("Authorization", format!("Bearer {}", self.config.api_key));
        if let Some(org) = &self.config.organization {
            req = req.header("OpenAI-Organization", org);
        }
        req
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
            _ => LlmError::ProviderError(format!("OpenAI API error {status}: {body}")),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn invoke(&self, prompt: &str) -> Result<String, EngineError> {
        let response = self.request(prompt, false).send().await.map_err(LlmError::HttpError)?;
        let response = Self::check_status(response).await?;
        let parsed: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
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
            if payload.trim() == "[DONE]" {
                return None;
            }
            match serde_json::from_str::<OpenAiStreamChunk>(&payload) {
                Ok(parsed) => {
                    let content = parsed
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                        .unwrap_or_default();
                    if content.is_empty() {
                        None
                    } else {
                        Some(Ok(Chunk { content }))
                    }
                }
                Err(e) => Some(Err(EngineError::from(LlmError::SerializationError(
                    e.to_string(),
                )))),
            }
        });

        Ok(Box::pin(chunks))
    }
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
}
