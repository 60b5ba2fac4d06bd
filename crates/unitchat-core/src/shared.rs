//! Shared types used across the UnitChat crates: configuration and model mode.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::keywords::KeywordSet;
use crate::session::SessionStore;

/// Env var naming an alternative config file.
pub const ENV_CONFIG_PATH: &str = "UNITCHAT_CONFIG";
/// Env var holding the model API key.
pub const ENV_API_KEY: &str = "GOOGLE_API_KEY";

const DEFAULT_CONFIG_PATH: &str = "config/unitchat.toml";
const ENV_PREFIX: &str = "UNITCHAT";

pub const DEFAULT_MODEL: &str = "models/gemini-1.5-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Which backend answers chat messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmMode {
    /// Live Gemini API; requires an API key.
    #[default]
    Gemini,
    /// Deterministic local replies, no network.
    Mock,
}

impl LlmMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmMode::Gemini => "gemini",
            LlmMode::Mock => "mock",
        }
    }
}

/// Global application configuration (gateway + model). Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Title shown in the UI and logs.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    pub llm_mode: LlmMode,
    /// Gemini model resource name, e.g. `models/gemini-1.5-flash`.
    pub model: String,
    pub api_base_url: String,
    /// Falls back to `GOOGLE_API_KEY` when not set in the file or `UNITCHAT__API_KEY`.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Upper bound for one completion call, streaming included.
    pub request_timeout_secs: u64,
    /// Sessions untouched for this long are discarded.
    pub session_idle_secs: u64,
    /// Upper bound on live sessions; the least recently used one is evicted beyond it.
    pub max_sessions: usize,
    /// If true, the gateway serves the static UI from `unitchat-frontend/`. (Config alias: `ui_enabled`)
    #[serde(default = "default_frontend_enabled", alias = "ui_enabled")]
    pub frontend_enabled: bool,
    /// Terms added to the built-in conversion vocabulary.
    #[serde(default)]
    pub extra_keywords: Vec<String>,
}

// Not a builder default: a default key next to its `ui_enabled` alias is a duplicate field.
fn default_frontend_enabled() -> bool {
    true
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            app_name: "AI Unit Conversion System".to_string(),
            port: 8001,
            llm_mode: LlmMode::Gemini,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            request_timeout_secs: 30,
            session_idle_secs: 30 * 60,
            max_sessions: 1_000,
            frontend_enabled: default_frontend_enabled(),
            extra_keywords: Vec::new(),
        }
    }
}

impl CoreConfig {
    /// Load config from file and environment.
    /// Precedence: env `UNITCHAT_CONFIG` path > `config/unitchat.toml` > defaults,
    /// overlaid by `UNITCHAT__*` variables. The API key falls back to `GOOGLE_API_KEY`.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load_from(Path::new(&config_path))?;
        if config.api_key().is_none() {
            config.api_key = std::env::var(ENV_API_KEY).ok();
        }
        Ok(config)
    }

    /// Load from a specific file (skipped when absent) plus `UNITCHAT__*` environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("app_name", defaults.app_name)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("llm_mode", defaults.llm_mode.as_str())?
            .set_default("model", defaults.model)?
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("session_idle_secs", defaults.session_idle_secs as i64)?
            .set_default("max_sessions", defaults.max_sessions as i64)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(built.try_deserialize()?)
    }

    /// Configured API key, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// The API key, or the fatal startup error when it is missing.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key()
            .ok_or(ConfigError::MissingApiKey { env: ENV_API_KEY })
    }

    /// True when the configured mode cannot start without a key.
    pub fn needs_api_key(&self) -> bool {
        self.llm_mode == LlmMode::Gemini
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs.max(1))
    }

    /// Session store sized by `session_idle_secs` and `max_sessions`.
    pub fn session_store(&self) -> SessionStore {
        SessionStore::with_limits(self.session_idle_timeout(), self.max_sessions)
    }

    /// Built-in vocabulary plus `extra_keywords`.
    pub fn keyword_set(&self) -> KeywordSet {
        KeywordSet::with_extra(&self.extra_keywords)
    }
}
