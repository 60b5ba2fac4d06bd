//! Per-session state: exchange history, latest exchange, and UI flags.
//!
//! A [`SessionContext`] is the explicit per-session object handed to every operation.
//! It owns both the rendered history ([`SessionState`]) and the model transcript, so two
//! sessions never see each other's conversation.

mod store;

pub use store::{SessionId, SessionStore};

use serde::{Deserialize, Serialize};

use crate::conversation::Transcript;
use crate::gate::{ERROR_PREFIX, REFUSAL_MESSAGE};

/// What an exchange's `response` text represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeKind {
    /// On-topic model reply, shown verbatim.
    Answer,
    /// Off-topic reply replaced by the fixed refusal.
    Refused,
    /// Remote call failed; `response` is the `"Error: ..."` text.
    Error,
}

/// One user query paired with its produced response. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub query: String,
    pub response: String,
    pub kind: ExchangeKind,
}

impl ExchangeKind {
    /// Classifies a response by its display text: the fixed refusal, an `"Error: "`
    /// message, or anything else as an answer.
    pub fn from_display_text(response: &str) -> Self {
        if response == REFUSAL_MESSAGE {
            ExchangeKind::Refused
        } else if response.starts_with(ERROR_PREFIX) {
            ExchangeKind::Error
        } else {
            ExchangeKind::Answer
        }
    }
}

impl Exchange {
    pub fn new(query: impl Into<String>, response: impl Into<String>, kind: ExchangeKind) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
            kind,
        }
    }
}

/// Toggles driven by user actions. No invariant links them to the history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiFlags {
    pub history_visible: bool,
    /// Pending text of the input control; cleared after every submission.
    pub input: String,
}

/// Append-only history plus UI flags for one session.
///
/// The latest exchange is always the tail of the history, so the two cannot diverge.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    history: Vec<Exchange>,
    flags: UiFlags,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a query and its display text, tagging the kind from the text. Never fails.
    pub fn append_exchange(&mut self, query: impl Into<String>, response: impl Into<String>) {
        let response = response.into();
        let kind = ExchangeKind::from_display_text(&response);
        self.append(Exchange::new(query, response, kind));
    }

    /// Records a tagged exchange; it becomes the latest one.
    pub fn append(&mut self, exchange: Exchange) {
        self.history.push(exchange);
    }

    pub fn toggle_history_visible(&mut self) {
        self.flags.history_visible = !self.flags.history_visible;
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.flags.input = text.into();
    }

    pub fn clear_input(&mut self) {
        self.flags.input.clear();
    }

    /// Full history in submission order.
    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    /// History most-recent-first, as the UI lists it.
    pub fn history_newest_first(&self) -> impl Iterator<Item = &Exchange> {
        self.history.iter().rev()
    }

    pub fn latest(&self) -> Option<&Exchange> {
        self.history.last()
    }

    pub fn flags(&self) -> &UiFlags {
        &self.flags
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Render-ready view. History is only included while it is toggled visible.
    pub fn snapshot(&self) -> SessionView {
        let history = if self.flags.history_visible {
            self.history_newest_first().cloned().collect()
        } else {
            Vec::new()
        };
        SessionView {
            exchange_count: self.history.len(),
            history_visible: self.flags.history_visible,
            latest: self.latest().cloned(),
            history,
        }
    }
}

/// Serialisable snapshot of a session for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub exchange_count: usize,
    pub history_visible: bool,
    pub latest: Option<Exchange>,
    /// Newest first; empty unless `history_visible`.
    pub history: Vec<Exchange>,
}

/// Everything one session owns: rendered state and the model transcript.
#[derive(Debug, Default)]
pub struct SessionContext {
    pub state: SessionState,
    pub transcript: Transcript,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }
}
