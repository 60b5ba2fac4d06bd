//! Submission workflow: gate the query, record the exchange, clear the input.

use crate::gate::ResponseGate;
use crate::session::{Exchange, SessionContext};

/// Result of one submission event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Empty input; nothing was sent or recorded.
    Ignored,
    /// The exchange appended to the session history.
    Recorded(Exchange),
}

/// Drives a submission through the gate and into the session state.
pub struct SubmissionWorkflow {
    gate: ResponseGate,
}

impl SubmissionWorkflow {
    pub fn new(gate: ResponseGate) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &ResponseGate {
        &self.gate
    }

    /// Processes one submission to completion for `ctx`.
    ///
    /// Whitespace-only text is a no-op. Otherwise the text goes through the gate as
    /// typed, the exchange is appended, and the input buffer is cleared.
    pub async fn submit(&self, ctx: &mut SessionContext, text: &str) -> Submission {
        if text.trim().is_empty() {
            ctx.state.clear_input();
            return Submission::Ignored;
        }

        ctx.state.set_input(text);
        let outcome = self.gate.get_response(&mut ctx.transcript, text).await;
        let exchange = Exchange::new(text, outcome.display_text(), outcome.kind());
        ctx.state.append(exchange.clone());
        ctx.state.clear_input();

        tracing::debug!(
            target: "unitchat::workflow",
            kind = ?exchange.kind,
            exchanges = ctx.state.len(),
            "Exchange recorded"
        );
        Submission::Recorded(exchange)
    }

    /// Flips history visibility; returns the new value.
    pub fn toggle_history(&self, ctx: &mut SessionContext) -> bool {
        ctx.state.toggle_history_visible();
        ctx.state.flags().history_visible
    }
}
