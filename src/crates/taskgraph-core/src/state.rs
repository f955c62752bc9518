//! Controller state

use crate::message::Message;
use std::time::Instant;

/// State threaded through the plan -> schedule -> join loop.
#[derive(Debug)]
pub struct State {
    /// Append-only conversation log, preserved across replans.
    pub messages: Vec<Message>,

    /// Set by the joiner; read by the controller to decide whether to loop
    /// back to the planner in replan mode.
    pub needs_replan: bool,

    /// Monotonic run start, used for relative logging only. Never
    /// wall-clock, so log deltas stay correct across clock adjustments.
    pub execution_start: Instant,
}

impl State {
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(user_query)],
            needs_replan: false,
            execution_start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.execution_start.elapsed().as_millis()
    }
}
