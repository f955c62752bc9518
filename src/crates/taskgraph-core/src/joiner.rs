//! Joiner
//!
//! Renders the round's tool results into a user-facing answer and asks
//! the LLM whether the run is complete or needs another planning round.

use crate::error::EngineError;
use crate::llm::LlmClient;
use crate::message::Message;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// `"Task {idx}: {content}"` lines sorted by numeric idx.
pub fn render_results_text(results: &BTreeMap<u32, String>) -> String {
    results
        .iter()
        .map(|(idx, content)| format!("Task {idx}: {content}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn synthesize_prompt(user_query: &str, results_text: &str) -> String {
    if results_text.is_empty() {
        return format!(
            "The user asked: {user_query}\n\nNo tasks were executed (empty plan). \
             Reply with a brief explanation that there was nothing to do."
        );
    }
    format!(
        "The user asked: {user_query}\n\nTask results:\n{results_text}\n\n\
         Write the final answer for the user, synthesizing these results."
    )
}

fn should_continue_prompt(user_query: &str, latest_response: &str) -> String {
    format!(
        "The user asked: {user_query}\n\nProposed answer:\n{latest_response}\n\n\
         Does this fully satisfy the request? Reply with exactly one word: \
         END if it does, REPLAN if more tasks are needed."
    )
}

/// Outcome of one join round.
pub struct JoinOutcome {
    pub assistant_message: Message,
    pub needs_replan: bool,
}

/// Synthesize an answer from this round's results and decide whether to
/// terminate or replan. `results` is the full, cumulative result map
/// (all rounds so far), since the synthesis prompt should see everything
/// produced, not just the latest round.
pub async fn join(
    llm: Arc<dyn LlmClient>,
    user_query: &str,
    results: &BTreeMap<u32, String>,
) -> Result<JoinOutcome, EngineError> {
    let results_text = render_results_text(results);

    let response = if results_text.is_empty() {
        "There were no tasks to execute for this request.".to_string()
    } else {
        llm.invoke(&synthesize_prompt(user_query, &results_text))
            .await?
    };
    debug!(response_len = response.len(), "joiner synthesized response");

    let needs_replan = if results_text.is_empty() {
        false
    } else {
        let decision = llm
            .invoke(&should_continue_prompt(user_query, &response))
            .await?;
        match decision.trim() {
            "REPLAN" => true,
            "END" => false,
            other => {
                warn!(decision = other, "unrecognized continuation decision, treating as END");
                false
            }
        }
    };

    Ok(JoinOutcome {
        assistant_message: Message::assistant(response),
        needs_replan,
    })
}
