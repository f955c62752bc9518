//! Core engine for the task compiler: plan, fetch/execute, join, replan.
//!
//! This crate defines the data model (`task`, `message`, `state`), the
//! external contracts concrete collaborators implement (`tools::Tool`,
//! `llm::LlmClient`), and the engine itself (`parser`, `planner`,
//! `scheduler`, `joiner`, `controller`). It has no opinion about which LLM
//! provider or which concrete tools are wired in; those live in the
//! `taskgraph-llm` and `taskgraph-tools` crates and are handed in by the
//! caller as `Arc<dyn LlmClient>` / a populated `ToolRegistry`.

pub mod config;
pub mod controller;
pub mod error;
pub mod init;
pub mod joiner;
pub mod llm;
pub mod message;
pub mod parser;
pub mod planner;
pub mod scheduler;
pub mod state;
pub mod task;
pub mod tools;

pub use config::{load_config, EngineConfig, ExecutionConfig, LlmConfig, LoggingConfig};
pub use controller::{run, ControllerOutcome};
pub use error::{EngineError, Result};
pub use llm::{Chunk, LlmClient};
pub use message::Message;
pub use state::State;
pub use task::{Task, TaskResult, JOIN_TOOL};
pub use tools::{InputSchema, ParamSchema, Tool, ToolRegistry};
