//! Error types for the task compiler engine
//!
//! Provides a unified error type for the planner/scheduler/joiner pipeline.

use std::fmt;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for engine operations.
///
/// Tool failures and plan-parse failures are deliberately *not* represented
/// here: per the scheduler's fail-soft policy they become `"ERROR: ..."`
/// result strings, never a propagated error.
#[derive(Debug)]
pub enum EngineError {
    /// Malformed configuration
    Config(String),

    /// The task graph has a cycle, a forward reference, or a dependency
    /// that was never satisfied.
    InvalidGraph(String),

    /// Replan rounds exceeded the configured cap.
    ReplanLimitExceeded { rounds: usize },

    /// LLM transport/provider failure. Propagates to the controller.
    Llm(String),

    /// IO error.
    Io(std::io::Error),

    /// Serialization/deserialization error.
    Serde(serde_json::Error),

    /// Generic error with message.
    Other(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::InvalidGraph(msg) => write!(f, "invalid task graph: {}", msg),
            Self::ReplanLimitExceeded { rounds } => {
                write!(f, "replan limit exceeded after {} rounds", rounds)
            }
            Self::Llm(msg) => write!(f, "LLM error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Serde(err) => write!(f, "serialization error: {}", err),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serde(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err)
    }
}

impl From<String> for EngineError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}

impl From<&str> for EngineError {
    fn from(msg: &str) -> Self {
        Self::Other(msg.to_string())
    }
}
