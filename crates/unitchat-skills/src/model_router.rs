//! Model Router: picks the chat backend (mock or Gemini) from configuration.

use unitchat_core::{ChatModel, ConfigError, CoreConfig, LlmMode, ModelError, TextStream, Turn};

use crate::gemini::GeminiClient;
use crate::mock::MockModel;

enum Backend {
    Mock(MockModel),
    Gemini(GeminiClient),
}

/// Routes each message to the backend chosen at startup.
pub struct ModelRouter {
    backend: Backend,
}

impl ModelRouter {
    pub fn mock() -> Self {
        Self {
            backend: Backend::Mock(MockModel::new()),
        }
    }

    pub fn gemini(client: GeminiClient) -> Self {
        Self {
            backend: Backend::Gemini(client),
        }
    }

    /// Builds the backend named by `config.llm_mode`.
    ///
    /// Gemini mode without an API key is a startup error.
    pub fn from_config(config: &CoreConfig) -> Result<Self, ConfigError> {
        let router = match config.llm_mode {
            LlmMode::Mock => Self::mock(),
            LlmMode::Gemini => {
                let key = config.require_api_key()?;
                Self::gemini(GeminiClient::from_config(config, key)?)
            }
        };
        tracing::info!(
            target: "unitchat::model",
            mode = router.mode().as_str(),
            model = router.name(),
            "Model router ready"
        );
        Ok(router)
    }

    pub fn mode(&self) -> LlmMode {
        match self.backend {
            Backend::Mock(_) => LlmMode::Mock,
            Backend::Gemini(_) => LlmMode::Gemini,
        }
    }
}

#[async_trait::async_trait]
impl ChatModel for ModelRouter {
    fn name(&self) -> &str {
        match &self.backend {
            Backend::Mock(model) => model.name(),
            Backend::Gemini(client) => client.name(),
        }
    }

    async fn send_message(&self, history: &[Turn], message: &str) -> Result<TextStream, ModelError> {
        match &self.backend {
            Backend::Mock(model) => model.send_message(history, message).await,
            Backend::Gemini(client) => client.send_message(history, message).await,
        }
    }
}
