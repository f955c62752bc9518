//! Task and TaskResult types
//!
//! A `Task` is one invocation of one tool with one argument set and a
//! dependency set. See the parser module for how tasks are recognized out
//! of an LLM token stream, and the scheduler module for how they execute.

use std::collections::BTreeMap;

/// Reserved tool name for the LLM-compiler "join" sentinel. Recognized by
/// the parser but never dispatched by the scheduler.
pub const JOIN_TOOL: &str = "join";

/// One invocation of one tool with one argument set and a dependency set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Unique, strictly positive, strictly increasing index within a run.
    pub idx: u32,

    /// Tool name, or the reserved sentinel [`JOIN_TOOL`].
    pub tool: String,

    /// Argument key -> value. Values may contain `$N` / `${N}` placeholders.
    pub args: BTreeMap<String, String>,

    /// Union of indices referenced via `$N` in `args` and the explicit
    /// `(deps: [...])` clause, ascending, deduplicated.
    pub dependencies: Vec<u32>,
}

impl Task {
    /// True if this task is the `join` sentinel: recognized by the parser
    /// but never executed by the scheduler.
    pub fn is_join(&self) -> bool {
        self.tool == JOIN_TOOL
    }

    /// Validate the local invariants that don't require knowledge of the
    /// rest of the plan: no self-dependency, no forward dependency.
    pub fn validate_local(&self) -> Result<(), String> {
        for &dep in &self.dependencies {
            if dep == self.idx {
                return Err(format!("task {} depends on itself", self.idx));
            }
            if dep >= self.idx {
                return Err(format!(
                    "task {} has forward dependency on {}",
                    self.idx, dep
                ));
            }
        }
        Ok(())
    }
}

/// The outcome of one completed task, keyed by `idx`. Once written an entry
/// is immutable for the remainder of the run; failures are encoded as an
/// `"ERROR: <message>"` string rather than a separate variant, per the
/// engine's fail-soft policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub idx: u32,
    pub content: String,
}

impl TaskResult {
    pub fn new(idx: u32, content: impl Into<String>) -> Self {
        Self {
            idx,
            content: content.into(),
        }
    }

    pub fn error(idx: u32, message: impl std::fmt::Display) -> Self {
        Self {
            idx,
            content: format!("ERROR: {}", message),
        }
    }

    pub fn is_error(&self) -> bool {
        self.content.starts_with("ERROR: ")
    }
}
