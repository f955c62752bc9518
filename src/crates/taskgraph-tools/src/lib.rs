//! Concrete tools and ambient helpers for the taskgraph task compiler.
//!
//! `tools` holds the `taskgraph_core::tools::Tool` implementations that a
//! driver wires into a `ToolRegistry` (directory/file scaffolding, LLM-backed
//! content generation). The rest of this crate is general-purpose supporting
//! code the scaffolding tools and a CLI driver lean on:
//!
//! - `config` - Configuration management with environment variable loading
//! - `error` - Error handling utilities with context and chain formatting
//! - `async_utils` - Retry policies and timeout utilities for async operations
//! - `validation` - Fluent validation API for type-safe data validation
//! - `serialization` - Stable JSON serialization and hashing utilities
//! - `logging` - Structured logging helpers and formatters

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;
pub mod serialization;
pub mod tools;
pub mod validation;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in this crate's own helpers (not tool execution
/// failures, which surface as `anyhow::Error` through the `Tool` trait).
#[derive(Debug, Error)]
pub enum ToolsError {
    /// General error with message
    #[error("tools error: {0}")]
    General(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for this crate's own helpers
pub type Result<T> = std::result::Result<T, ToolsError>;

/// Configuration structure for the ambient helpers in this crate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Enable verbose logging
    pub verbose: bool,
    /// Output directory
    pub output_dir: Option<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            output_dir: None,
        }
    }
}

impl ToolsConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbose mode
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set output directory
    pub fn with_output_dir(mut self, dir: impl Into<String>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}
