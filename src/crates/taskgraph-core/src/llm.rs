//! LLM adapter contract
//!
//! The engine depends only on this trait; concrete providers (OpenAI,
//! Anthropic, a scripted provider for tests, ...) live in the `taskgraph-llm`
//! crate and are handed to the planner/joiner as `Arc<dyn LlmClient>`.

use crate::error::EngineError;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// One chunk of a streaming completion. Concatenation of every chunk's
/// `content` across a stream equals the full completion.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub content: String,
}

/// Required capabilities of an LLM provider, per the engine's external
/// interface contract. The engine always requests temperature 0;
/// determinism of replays with the same prompt is advisory only.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Synchronous (non-streaming) completion.
    async fn invoke(&self, prompt: &str) -> Result<String, EngineError>;

    /// Streaming completion. Each item is one chunk, or an error that
    /// terminates the stream.
    async fn stream(
        &self,
        prompt: &str,
    ) -> Result<BoxStream<'static, Result<Chunk, EngineError>>, EngineError>;
}
