//! Remote LLM provider implementations.
//!
//! - **OpenAI** — OpenAI-compatible chat completions (`/chat/completions`).
//! - **Claude** — Anthropic's Messages API (`/v1/messages`).

mod sse;

pub mod claude;
pub mod openai;

pub use claude::ClaudeClient;
pub use openai::OpenAiClient;
