//! Initialization helpers
//!
//! Directory/credential bootstrapping. The engine itself persists nothing;
//! these helpers exist so a driver (e.g. the CLI) can locate the config
//! directory and fail fast when the LLM credential is missing.

use crate::error::{EngineError, Result};
use std::path::PathBuf;

/// Default configuration directory name
pub const CONFIG_DIR: &str = ".taskgraph";

/// Default configuration file name
pub const CONFIG_FILE: &str = "config.toml";

/// Get the engine home directory (`~/.taskgraph`)
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR))
        .ok_or_else(|| EngineError::Config("could not determine home directory".to_string()))
}

/// Path to the user-level configuration file
pub fn get_user_config_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join(CONFIG_FILE))
}

/// Path to the project-level configuration file
pub fn get_project_config_path() -> Result<PathBuf> {
    Ok(PathBuf::from(".").join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Verify the LLM credential is present, per the environment contract: its
/// absence SHOULD cause the runner to exit early with a user-visible message.
pub fn require_credential(api_key: &Option<String>, env_var: &str) -> Result<String> {
    if let Some(key) = api_key {
        if !key.is_empty() {
            return Ok(key.clone());
        }
    }

    std::env::var(env_var).map_err(|_| {
        EngineError::Config(format!(
            "missing LLM credential: set {} or configure llm.api_key",
            env_var
        ))
    })
}
