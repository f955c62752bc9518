//! Configuration management for the task compiler engine
//!
//! Supports dual-location configuration:
//! - User-level: `~/.taskgraph/config.toml`
//! - Project-level: `./.taskgraph/config.toml`
//!
//! Project-level config overrides user-level config, and `TASKGRAPH_*`
//! environment variables override both.

mod loader;
mod schema;

pub use loader::ConfigLoader;
pub use schema::{EngineConfig, ExecutionConfig, LlmConfig, LoggingConfig};

use crate::error::Result;

/// Load configuration from both locations with project config taking precedence
pub async fn load_config() -> Result<EngineConfig> {
    let loader = ConfigLoader::new();
    loader.load().await
}
