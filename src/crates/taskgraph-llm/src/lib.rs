//! LLM provider implementations for the task compiler engine.
//!
//! This crate provides concrete implementations of
//! `taskgraph_core::llm::LlmClient` for OpenAI-compatible and
//! Anthropic-compatible chat completion APIs, plus a scripted provider
//! for deterministic tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use taskgraph_llm::config::RemoteLlmConfig;
//! use taskgraph_llm::remote::OpenAiClient;
//! use taskgraph_core::llm::LlmClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RemoteLlmConfig::from_env(
//!         "OPENAI_API_KEY",
//!         "https://api.openai.com/v1",
//!         "gpt-4",
//!     )?;
//!     let client = OpenAiClient::new(config);
//!     let response = client.invoke("Explain quantum computing briefly").await?;
//!     println!("{response}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod mock;
pub mod remote;

pub use config::RemoteLlmConfig;
pub use error::{LlmError, Result};
pub use mock::ScriptedProvider;
pub use remote::{ClaudeClient, OpenAiClient};
