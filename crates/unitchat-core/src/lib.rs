//! unitchat-core: keyword-gated chat core for the unit-conversion assistant.
//!
//! Holds the pieces that do not touch the network or HTTP: the conversion vocabulary,
//! the response gate, per-session state, the submission workflow, and configuration.

mod conversation;
mod error;
mod gate;
mod keywords;
mod model;
mod session;
mod shared;
mod units;
mod workflow;

pub use conversation::{Role, Transcript, Turn};
pub use error::{ConfigError, ModelError};
pub use gate::{collect_fragments, GateOutcome, ResponseGate, ERROR_PREFIX, REFUSAL_MESSAGE};
pub use keywords::{KeywordSet, DEFAULT_KEYWORDS};
pub use model::{text_stream, ChatModel, TextStream};
pub use session::{
    Exchange, ExchangeKind, SessionContext, SessionId, SessionState, SessionStore, SessionView,
    UiFlags,
};
pub use shared::{
    CoreConfig, LlmMode, DEFAULT_API_BASE_URL, DEFAULT_MODEL, ENV_API_KEY, ENV_CONFIG_PATH,
};
pub use units::{unit_catalog, UnitCategory};
pub use workflow::{Submission, SubmissionWorkflow};
