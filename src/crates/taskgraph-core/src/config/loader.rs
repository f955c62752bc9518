//! Configuration loader with dual-location support
//!
//! Loads configuration from:
//! 1. Default values
//! 2. User-level config: `~/.taskgraph/config.toml`
//! 3. Project-level config: `./.taskgraph/config.toml`
//!
//! Later configs override earlier ones.

use crate::config::schema::EngineConfig;
use crate::error::{EngineError, Result};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

/// Configuration loader that handles both user and project configs
pub struct ConfigLoader {
    user_config_path: PathBuf,
    project_config_path: PathBuf,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            user_config_path: Self::user_config_path(),
            project_config_path: Self::project_config_path(),
        }
    }

    fn user_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".taskgraph")
            .join("config.toml")
    }

    fn project_config_path() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".taskgraph")
            .join("config.toml")
    }

    /// Load configuration from both locations, project taking precedence,
    /// then apply `TASKGRAPH_`-prefixed environment overrides.
    pub async fn load(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::default();
        info!("loading engine configuration with defaults");

        match self.load_from_path(&self.user_config_path).await {
            Ok(user_config) => {
                debug!(path = %self.user_config_path.display(), "loaded user-level config");
                config.merge(user_config);
            }
            Err(e) => {
                debug!(path = %self.user_config_path.display(), error = %e, "no user-level config");
            }
        }

        match self.load_from_path(&self.project_config_path).await {
            Ok(project_config) => {
                debug!(path = %self.project_config_path.display(), "loaded project-level config");
                config.merge(project_config);
            }
            Err(e) => {
                debug!(path = %self.project_config_path.display(), error = %e, "no project-level config");
            }
        }

        self.apply_env_overrides(&mut config);
        config.resolve_env_vars();

        info!("engine configuration loaded");
        Ok(config)
    }

    fn apply_env_overrides(&self, config: &mut EngineConfig) {
        if let Ok(provider) = std::env::var("TASKGRAPH_LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(model) = std::env::var("TASKGRAPH_LLM_MODEL") {
            config.llm.model = model;
        }
        if let Ok(max_tasks) = std::env::var("TASKGRAPH_MAX_CONCURRENT_TASKS") {
            if let Ok(n) = max_tasks.parse() {
                config.execution.max_concurrent_tasks = n;
            }
        }
    }

    async fn load_from_path(&self, path: &PathBuf) -> Result<EngineConfig> {
        if !path.exists() {
            return Err(EngineError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| EngineError::Config(format!("failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| EngineError::Config(format!("failed to parse config: {}", e)))
    }

    /// Path to the user-level config file
    pub fn user_config_path_ref(&self) -> &PathBuf {
        &self.user_config_path
    }

    /// Path to the project-level config file
    pub fn project_config_path_ref(&self) -> &PathBuf {
        &self.project_config_path
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
