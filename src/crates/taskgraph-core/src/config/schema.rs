//! Configuration schema for the task compiler engine

use serde::{Deserialize, Serialize};

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// LLM provider configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Execution (scheduler/controller) configuration
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name: "openai", "anthropic", or "scripted" (test only)
    pub provider: String,

    /// Model name
    pub model: String,

    /// API key (supports `${VAR}` environment interpolation)
    pub api_key: Option<String>,

    /// API base URL (for custom/self-hosted endpoints)
    pub api_base: Option<String>,

    /// Temperature for generation. The engine always sends 0.0 regardless
    /// of this value; it is retained for callers that bypass the engine.
    pub temperature: f32,

    /// Maximum tokens to generate per completion
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-3-sonnet".to_string(),
            api_key: None,
            api_base: None,
            temperature: 0.0,
            max_tokens: 4096,
        }
    }
}

/// Scheduler and controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Worker pool size hint for concurrent tool dispatch
    pub max_concurrent_tasks: usize,

    /// Per-task timeout in seconds. Enforced around each tool `invoke`
    /// call; a timed-out task is recorded as an `"ERROR: ..."` result,
    /// same as any other tool failure.
    pub task_timeout_secs: u64,

    /// Waiter polling interval in milliseconds (spec default: 200ms)
    #[serde(default = "default_retry_after_ms")]
    pub retry_after_ms: u64,

    /// Maximum replan rounds before the controller gives up
    #[serde(default = "default_max_replan_rounds")]
    pub max_replan_rounds: usize,
}

fn default_retry_after_ms() -> u64 {
    200
}

fn default_max_replan_rounds() -> usize {
    3
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 8,
            task_timeout_secs: 120,
            retry_after_ms: default_retry_after_ms(),
            max_replan_rounds: default_max_replan_rounds(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,

    /// Enable colored output
    pub colored: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            colored: true,
        }
    }
}

impl EngineConfig {
    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: EngineConfig) {
        self.llm = other.llm;
        self.execution = other.execution;
        self.logging = other.logging;
    }

    /// Resolve `${VAR}` environment interpolation in string fields
    pub fn resolve_env_vars(&mut self) {
        if let Some(ref api_key) = self.llm.api_key {
            self.llm.api_key = Some(Self::expand_env_var(api_key));
        }
        if let Some(ref api_base) = self.llm.api_base {
            self.llm.api_base = Some(Self::expand_env_var(api_base));
        }
    }

    fn expand_env_var(value: &str) -> String {
        if let Some(var_name) = value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
            std::env::var(var_name).unwrap_or_else(|_| value.to_string())
        } else {
            value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.execution.retry_after_ms, 200);
        assert_eq!(config.execution.max_replan_rounds, 3);
    }

    #[test]
    fn test_merge_config() {
        let mut base = EngineConfig::default();
        let mut override_config = EngineConfig::default();
        override_config.llm.model = "claude-3-opus".to_string();
        override_config.execution.max_concurrent_tasks = 16;

        base.merge(override_config);

        assert_eq!(base.llm.model, "claude-3-opus");
        assert_eq!(base.execution.max_concurrent_tasks, 16);
        assert_eq!(base.llm.provider, "anthropic");
    }

    #[test]
    fn test_env_var_expansion() {
        let mut config = EngineConfig::default();
        config.llm.api_key = Some("${TEST_TASKGRAPH_API_KEY}".to_string());

        std::env::set_var("TEST_TASKGRAPH_API_KEY", "test-key-123");
        config.resolve_env_vars();
        assert_eq!(config.llm.api_key, Some("test-key-123".to_string()));
        std::env::remove_var("TEST_TASKGRAPH_API_KEY");
    }

    #[test]
    fn test_execution_config_deserializes_with_defaults() {
        let toml = r#"
            max_concurrent_tasks = 4
            task_timeout_secs = 60
        "#;
        let config: ExecutionConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.retry_after_ms, 200);
        assert_eq!(config.max_replan_rounds, 3);
    }
}
