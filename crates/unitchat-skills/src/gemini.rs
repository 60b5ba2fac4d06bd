//! Gemini client: `streamGenerateContent` over Server-Sent Events.

use std::time::Duration;

use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use unitchat_core::{ChatModel, ConfigError, CoreConfig, ModelError, Role, TextStream, Turn};

const STREAM_METHOD: &str = ":streamGenerateContent?alt=sse";
const API_VERSION: &str = "v1beta";
/// Error bodies are cut to this many chars before reaching the user.
const MAX_ERROR_BODY: usize = 300;
/// Finish reasons that end a candidate normally.
const NORMAL_FINISH: [&str; 2] = ["STOP", "MAX_TOKENS"];

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// HTTP client for the Gemini `streamGenerateContent` endpoint.
///
/// The reply is exposed as a [`TextStream`] of fragments in arrival order; the caller
/// decides whether to buffer it.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    /// Full endpoint URL (base + version + model + method).
    url: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Fails only when the HTTP client cannot be built (e.g. TLS backend init).
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let model: String = model.into();
        let model = if model.starts_with("models/") {
            model
        } else {
            format!("models/{model}")
        };
        let base: String = base_url.into();
        let url = format!(
            "{}/{API_VERSION}/{model}{STREAM_METHOD}",
            base.trim_end_matches('/')
        );
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model,
            url,
            timeout,
        })
    }

    pub fn from_config(config: &CoreConfig, api_key: &str) -> Result<Self, ConfigError> {
        Self::new(
            api_key,
            config.model.clone(),
            config.api_base_url.clone(),
            config.request_timeout(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }

    fn request_error(&self, err: reqwest::Error) -> ModelError {
        if err.is_timeout() {
            ModelError::Timeout(self.timeout)
        } else {
            ModelError::request(err.to_string())
        }
    }
}

#[async_trait::async_trait]
impl ChatModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn send_message(&self, history: &[Turn], message: &str) -> Result<TextStream, ModelError> {
        let contents = history
            .iter()
            .map(|turn| Content {
                role: turn.role.as_str(),
                parts: [Part { text: &turn.text }],
            })
            .chain(std::iter::once(Content {
                role: Role::User.as_str(),
                parts: [Part { text: message }],
            }))
            .collect();
        let request = GenerateContentRequest { contents };

        tracing::debug!(
            target: "unitchat::gemini",
            model = %self.model,
            turns = history.len() + 1,
            "Sending streamGenerateContent request"
        );

        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(target: "unitchat::gemini", "Gemini returned {status}: {body}");
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: error_summary(&body),
            });
        }

        let timeout = self.timeout;
        let chunks = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(timeout)
                } else {
                    ModelError::request(e.to_string())
                }
            })
        });
        Ok(fragment_stream(chunks))
    }
}

/// Best short description of an error body: the API's `error.message` when present.
fn error_summary(body: &str) -> String {
    let message = serde_json::from_str::<GenerateContentResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    message.chars().take(MAX_ERROR_BODY).collect()
}

/// Turns a raw SSE byte stream into reply fragments.
///
/// Ends after the first error; events without text are skipped.
pub fn fragment_stream<S, B>(chunks: S) -> TextStream
where
    S: Stream<Item = Result<B, ModelError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let events = Box::pin(chunks.eventsource());

    stream::unfold(Some(events), |events| async move {
        let mut events = events?;
        loop {
            match events.next().await? {
                Ok(event) => match parse_event(&event.data) {
                    Ok(Some(text)) => return Some((Ok(text), Some(events))),
                    Ok(None) => continue,
                    Err(e) => return Some((Err(e), None)),
                },
                Err(e) => return Some((Err(stream_error(e)), None)),
            }
        }
    })
    .boxed()
}

fn stream_error(err: EventStreamError<ModelError>) -> ModelError {
    match err {
        EventStreamError::Transport(e) => e,
        other => ModelError::malformed(format!("invalid event stream: {other}")),
    }
}

/// Parses one SSE `data` payload into the fragment text it carries, if any.
fn parse_event(data: &str) -> Result<Option<String>, ModelError> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    let chunk: GenerateContentResponse = serde_json::from_str(data)
        .map_err(|e| ModelError::malformed(format!("invalid stream chunk: {e}")))?;

    if let Some(err) = chunk.error {
        let message = match err.status {
            Some(status) => format!("{status}: {}", err.message),
            None => err.message,
        };
        return Err(ModelError::Api(message));
    }

    if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ModelError::Blocked(reason));
    }

    let Some(candidate) = chunk.candidates.into_iter().next() else {
        return Ok(None);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return match candidate.finish_reason {
            Some(reason) if !NORMAL_FINISH.contains(&reason.as_str()) => {
                Err(ModelError::Blocked(reason))
            }
            _ => Ok(None),
        };
    }
    Ok(Some(text))
}
