//! Conversation log
//!
//! The `messages` sequence is append-only within a run and survives
//! replans; the result map for a replan round is reconstructed by scanning
//! `Message::Tool` entries rather than carried forward as separate state.

use std::collections::{BTreeMap, BTreeSet};

/// One entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// The original (or replan-triggering) user request.
    User(String),

    /// Text produced by the joiner's synthesis call.
    Assistant(String),

    /// The canonical record of one executed task. A subsequent replan's
    /// result map is reconstructed by scanning these.
    Tool {
        idx: u32,
        tool_name: String,
        args: BTreeMap<String, String>,
        content: String,
    },
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::User(text.into())
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant(text.into())
    }

    /// Reconstruct the result map (idx -> content) from every `Tool`
    /// message in a log, in whatever order they appear.
    pub fn result_map(messages: &[Message]) -> BTreeMap<u32, String> {
        messages
            .iter()
            .filter_map(|m| match m {
                Message::Tool { idx, content, .. } => Some((*idx, content.clone())),
                _ => None,
            })
            .collect()
    }

    /// The highest task index recorded in the log so far, or `0` if none.
    pub fn max_existing_idx(messages: &[Message]) -> u32 {
        messages
            .iter()
            .filter_map(|m| match m {
                Message::Tool { idx, .. } => Some(*idx),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Every task index already completed (present as a `Tool` message).
    pub fn completed_indices(messages: &[Message]) -> BTreeSet<u32> {
        messages
            .iter()
            .filter_map(|m| match m {
                Message::Tool { idx, .. } => Some(*idx),
                _ => None,
            })
            .collect()
    }

    /// The text of the most recent user message, if any.
    pub fn last_user_text(messages: &[Message]) -> Option<&str> {
        messages.iter().rev().find_map(|m| match m {
            Message::User(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// The text of the most recent assistant message, if any.
    pub fn last_assistant_text(messages: &[Message]) -> Option<&str> {
        messages.iter().rev().find_map(|m| match m {
            Message::Assistant(text) => Some(text.as_str()),
            _ => None,
        })
    }
}
