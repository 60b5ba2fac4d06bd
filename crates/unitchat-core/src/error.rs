//! Error types shared by the gateway and the model backends.

use std::time::Duration;

use thiserror::Error;

/// Startup failures. Any of these halts the process before a request is served.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration load failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("{env} is missing. Please check your .env file.")]
    MissingApiKey { env: &'static str },

    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),
}

/// Failure of a single remote completion call.
///
/// The `Display` output is the failure description shown to the user after
/// the `"Error: "` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model API error: {0}")]
    Api(String),

    #[error("response blocked: {0}")]
    Blocked(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no reply within {}s", .0.as_secs_f32())]
    Timeout(Duration),
}

impl ModelError {
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
