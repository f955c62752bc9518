//! Controller graph
//!
//! A hand-rolled `plan -> schedule -> join; while needs_replan: repeat`
//! loop. A dedicated graph library would be overkill for a flow this
//! small (see the design notes this engine follows): `start` feeds
//! straight into plan-and-schedule, the conditional replan edge loops
//! back to it, and anything else falls through to termination.

use crate::config::ExecutionConfig;
use crate::error::EngineError;
use crate::joiner::{self, JoinOutcome};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::planner::{self, PlanningContext, ReplanContext};
use crate::scheduler::Scheduler;
use crate::state::State;
use crate::tools::ToolRegistry;
use std::sync::Arc;
use tracing::{info, warn};

/// What the controller produced once the run terminates.
pub struct ControllerOutcome {
    pub messages: Vec<Message>,
    pub final_response: String,
    pub rounds: usize,
}

/// Run the engine to completion for one user query: plan, schedule,
/// join, and replan until the joiner signals `END` or the configured
/// replan cap is hit.
pub async fn run(
    user_query: impl Into<String>,
    llm: Arc<dyn LlmClient>,
    registry: ToolRegistry,
    config: ExecutionConfig,
) -> Result<ControllerOutcome, EngineError> {
    let mut state = State::new(user_query);
    let scheduler = Scheduler::new(registry.clone(), config.clone());

    let mut round = 0usize;
    loop {
        round += 1;
        if round > config.max_replan_rounds {
            return Err(EngineError::ReplanLimitExceeded {
                rounds: config.max_replan_rounds,
            });
        }
        info!(round, "starting plan-and-schedule round");

        let existing_results = Message::result_map(&state.messages);
        let max_existing_idx = Message::max_existing_idx(&state.messages);
        let user_text = planner::last_user_query(&state.messages);

        let replan_ctx = if round == 1 {
            None
        } else {
            let latest_response = Message::last_assistant_text(&state.messages)
                .unwrap_or_default()
                .to_string();
            let results_text = joiner::render_results_text(&existing_results);
            Some((results_text, latest_response, max_existing_idx))
        };

        let ctx = PlanningContext {
            registry: &registry,
            user_query: &user_text,
            replan: replan_ctx.as_ref().map(|(results_text, latest_response, max_existing_idx)| {
                ReplanContext {
                    results_text,
                    latest_response,
                    max_existing_idx: *max_existing_idx,
                }
            }),
        };

        let (rx, plan_handle) = planner::spawn(Arc::clone(&llm), registry.clone(), &ctx);
        let new_messages = scheduler.run(rx, existing_results.clone()).await?;
        plan_handle.await.map_err(|e| {
            EngineError::Other(format!("planner task failed to join: {e}"))
        })??;

        state.messages.extend(new_messages);

        let all_results = Message::result_map(&state.messages);
        let JoinOutcome {
            assistant_message,
            needs_replan,
        } = joiner::join(Arc::clone(&llm), &user_text, &all_results).await?;

        let final_response = match &assistant_message {
            Message::Assistant(text) => text.clone(),
            _ => unreachable!("joiner always produces an Assistant message"),
        };
        state.messages.push(assistant_message);
        state.needs_replan = needs_replan;

        if !needs_replan {
            info!(round, elapsed_ms = state.elapsed_ms(), "run complete");
            return Ok(ControllerOutcome {
                messages: state.messages,
                final_response,
                rounds: round,
            });
        }
        warn!(round, "joiner requested replan");
    }
}
