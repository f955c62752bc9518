//! Planner
//!
//! Assembles the planning prompt, drives the LLM's streaming completion
//! API, and feeds the stream incrementally to the [`crate::parser`] so
//! tasks are produced lazily: the first ready task can be dispatched by
//! the scheduler before the planner has finished receiving the rest of
//! the plan.

use crate::error::EngineError;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::parser::{split_complete_lines, PlanParser};
use crate::task::Task;
use crate::tools::{Tool, ToolRegistry};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Everything the prompt template needs. Built once per planning round by
/// the controller and handed to [`plan`].
pub struct PlanningContext<'a> {
    pub registry: &'a ToolRegistry,
    pub user_query: &'a str,
    /// `None` for an initial plan; `Some` for a replan round.
    pub replan: Option<ReplanContext<'a>>,
}

/// Replan-only prompt variables, per the replan prompt contract.
pub struct ReplanContext<'a> {
    pub results_text: &'a str,
    pub latest_response: &'a str,
    pub max_existing_idx: u32,
}

/// Render the planning prompt. Wording is not part of the contract; only
/// the slots are: `tool_count`, `tool_descriptions`, `tool_names`,
/// `user_query`, and in replan mode `results_text`, `latest_response`,
/// `max_existing_idx`.
pub fn build_prompt(ctx: &PlanningContext<'_>) -> String {
    let tool_names = ctx.registry.names();
    let tool_count = tool_names.len();
    let tool_descriptions = tool_names
        .iter()
        .filter_map(|name| ctx.registry.get(name))
        .map(|tool| describe_tool(tool.as_ref()))
        .collect::<Vec<_>>()
        .join("\n");
    let tool_names_csv = tool_names.join(", ");

    let mut prompt = String::new();
    prompt.push_str("You are a task planner. Decompose the user request into tasks.\n\n");
    prompt.push_str(&format!("Available tools ({tool_count}): {tool_names_csv}\n\n"));
    prompt.push_str(&format!("Tool descriptions:\n{tool_descriptions}\n\n"));
    prompt.push_str(&format!("User request: {}\n\n", ctx.user_query));

    if let Some(replan) = &ctx.replan {
        prompt.push_str("This is a replan. Prior results:\n");
        prompt.push_str(replan.results_text);
        prompt.push_str(&format!("\n\nPrevious response: {}\n", replan.latest_response));
        prompt.push_str(&format!(
            "New task indices must be strictly greater than {}.\n",
            replan.max_existing_idx
        ));
    }

    prompt.push_str(
        "\nEmit one task per line: idx. tool(key='value', ...) (deps: [d1, d2])\n\
         The deps clause is optional. End with a `join()` line.\n",
    );
    prompt
}

fn describe_tool(tool: &dyn Tool) -> String {
    let schema = tool.input_schema();
    let params = schema
        .properties
        .iter()
        .map(|(name, param)| {
            let required = if schema.required.contains(name) {
                "required"
            } else {
                "optional"
            };
            format!("{name}: {} ({required})", param.param_type)
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("- {}: {} [{}]", tool.name(), tool.description(), params)
}

/// Drive the LLM's streaming completion, incrementally parsing tasks out
/// of the accumulated buffer and sending each newly-recognized task to
/// `tx` as soon as it's recognized. Returns once the stream ends and the
/// trailing partial line (if any) has been flushed.
pub async fn plan(
    llm: Arc<dyn LlmClient>,
    registry: ToolRegistry,
    prompt: String,
    tx: mpsc::Sender<Task>,
) -> Result<(), EngineError> {
    let mut stream = llm.stream(&prompt).await?;
    let mut parser = PlanParser::new();
    let mut buffer = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buffer.push_str(&chunk.content);

        let (complete_lines, _tail) = split_complete_lines(&buffer);
        let tasks = parser.feed_lines(complete_lines.into_iter(), &registry);
        for task in tasks {
            debug!(idx = task.idx, tool = %task.tool, "planner emitted task");
            if tx.send(task).await.is_err() {
                // Scheduler side dropped; nothing more to do.
                return Ok(());
            }
        }
        // Advance buffer past everything fed so far, keeping the tail.
        if let Some(pos) = buffer.rfind('\n') {
            buffer = buffer[pos + 1..].to_string();
        }
    }

    if !buffer.trim().is_empty() {
        if let Some(task) = parser.parse_line(&buffer, &registry) {
            debug!(idx = task.idx, tool = %task.tool, "planner emitted trailing task");
            let _ = tx.send(task).await;
        } else {
            warn!(line = %buffer, "planner dropped unparsable trailing line");
        }
    }

    Ok(())
}

/// Build the prompt and spawn the streaming planner loop, returning the
/// receiving half of the task channel. The scheduler consumes from this
/// channel until it closes.
pub fn spawn(
    llm: Arc<dyn LlmClient>,
    registry: ToolRegistry,
    ctx: &PlanningContext<'_>,
) -> (mpsc::Receiver<Task>, tokio::task::JoinHandle<Result<(), EngineError>>) {
    let prompt = build_prompt(ctx);
    let (tx, rx) = mpsc::channel(32);
    let handle = tokio::spawn(plan(llm, registry, prompt, tx));
    (rx, handle)
}

/// Render the last user message as the `user_query` slot, or an empty
/// string if there is none.
pub fn last_user_query(messages: &[Message]) -> String {
    Message::last_user_text(messages).unwrap_or_default().to_string()
}
