//! A scripted provider for deterministic planner/joiner tests and local
//! demos that don't need a live API key.

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use std::sync::Mutex;
use taskgraph_core::error::EngineError;
use taskgraph_core::llm::{Chunk, LlmClient};

/// Replays a fixed sequence of responses in call order, one per
/// `invoke`/`stream` call. Panics (test-only failure mode) if more calls
/// are made than responses were scripted.
pub struct ScriptedProvider {
    responses: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
        }
    }

    fn next_response(&self) -> String {
        let mut responses = self.responses.lock().expect("scripted provider mutex poisoned");
        if responses.is_empty() {
            panic!("ScriptedProvider ran out of scripted responses");
        }
        responses.remove(0)
    }
}

#[async_trait]
impl LlmClient for ScriptedProvider {
    async fn invoke(&self, _prompt: &str) -> Result<String, EngineError> {
        Ok(self.next_response())
    }

    async fn stream(
        &self,
        _prompt: &str,
    ) -> Result<BoxStream<'static, Result<Chunk, EngineError>>, EngineError> {
        let response = self.next_response();
        let chunk = Chunk { content: response };
        Ok(Box::pin(stream::iter(vec![Ok(chunk)])))
    }
}
