//! Response Gate: asks the model, buffers the streamed reply, and only lets
//! unit-conversion answers through.

use std::sync::Arc;
use std::time::Duration;

use futures_util::TryStreamExt;

use crate::conversation::{Transcript, Turn};
use crate::error::ModelError;
use crate::keywords::KeywordSet;
use crate::model::{ChatModel, TextStream};
use crate::session::ExchangeKind;

/// Shown instead of any reply that mentions no conversion term.
pub const REFUSAL_MESSAGE: &str = "I can only perform unit conversions. Please ask about a unit.";
/// Prefix of the display text for failed calls.
pub const ERROR_PREFIX: &str = "Error: ";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tagged result of one gated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// On-topic reply, original casing.
    Answer(String),
    /// The model answered, but off-topic. `reply` is kept for logs and the transcript only.
    Refused { reply: String },
    Failed(ModelError),
}

impl GateOutcome {
    /// Text the user sees for this outcome.
    pub fn display_text(&self) -> String {
        match self {
            GateOutcome::Answer(reply) => reply.clone(),
            GateOutcome::Refused { .. } => REFUSAL_MESSAGE.to_string(),
            GateOutcome::Failed(err) => format!("{ERROR_PREFIX}{err}"),
        }
    }

    pub fn kind(&self) -> ExchangeKind {
        match self {
            GateOutcome::Answer(_) => ExchangeKind::Answer,
            GateOutcome::Refused { .. } => ExchangeKind::Refused,
            GateOutcome::Failed(_) => ExchangeKind::Error,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, GateOutcome::Failed(_))
    }
}

/// Sends queries to a [`ChatModel`] and filters replies against a [`KeywordSet`].
pub struct ResponseGate {
    model: Arc<dyn ChatModel>,
    keywords: KeywordSet,
    timeout: Duration,
}

impl ResponseGate {
    pub fn new(model: Arc<dyn ChatModel>, keywords: KeywordSet) -> Self {
        Self {
            model,
            keywords,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bounds each call, streaming included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Asks the model with the session's transcript and classifies the full reply.
    ///
    /// `query` must be non-empty; callers skip the call for empty input. A reply that
    /// arrives (on-topic or not) extends `transcript` by the user turn and the reply.
    /// Failures leave it untouched and come back as [`GateOutcome::Failed`].
    pub async fn get_response(&self, transcript: &mut Transcript, query: &str) -> GateOutcome {
        let result = tokio::time::timeout(self.timeout, self.fetch_reply(transcript.turns(), query)).await;

        let reply = match result {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => return self.failed(err),
            Err(_) => return self.failed(ModelError::Timeout(self.timeout)),
        };

        transcript.record(query, &reply);

        match self.keywords.first_match(&reply) {
            Some(term) => {
                tracing::info!(
                    target: "unitchat::gate",
                    model = self.model.name(),
                    reply_len = reply.len(),
                    matched = term,
                    "Reply passed keyword gate"
                );
                GateOutcome::Answer(reply)
            }
            None => {
                tracing::info!(
                    target: "unitchat::gate",
                    model = self.model.name(),
                    reply_len = reply.len(),
                    "Reply refused: no conversion keyword"
                );
                GateOutcome::Refused { reply }
            }
        }
    }

    async fn fetch_reply(&self, history: &[Turn], query: &str) -> Result<String, ModelError> {
        let fragments = self.model.send_message(history, query).await?;
        collect_fragments(fragments).await
    }

    fn failed(&self, err: ModelError) -> GateOutcome {
        tracing::warn!(
            target: "unitchat::gate",
            model = self.model.name(),
            error = %err,
            "Model call failed"
        );
        GateOutcome::Failed(err)
    }
}

/// Drains a fragment stream, concatenating in arrival order. Stops at the first error.
pub async fn collect_fragments(fragments: TextStream) -> Result<String, ModelError> {
    fragments
        .try_fold(String::new(), |mut reply, fragment| async move {
            reply.push_str(&fragment);
            Ok(reply)
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::text_stream;
    use futures_util::stream::{self, StreamExt};
    use std::sync::Mutex;

    /// Replies with fixed fragments and remembers the history it was given.
    struct ScriptedModel {
        fragments: Vec<&'static str>,
        seen_history: Mutex<Vec<usize>>,
    }

    impl ScriptedModel {
        fn new(fragments: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                fragments,
                seen_history: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl ChatModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn send_message(
            &self,
            history: &[Turn],
            _message: &str,
        ) -> Result<TextStream, ModelError> {
            self.seen_history.lock().unwrap().push(history.len());
            Ok(text_stream(self.fragments.clone()))
        }
    }

    struct FailingModel(ModelError);

    #[async_trait::async_trait]
    impl ChatModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        async fn send_message(&self, _: &[Turn], _: &str) -> Result<TextStream, ModelError> {
            Err(self.0.clone())
        }
    }

    struct SlowModel;

    #[async_trait::async_trait]
    impl ChatModel for SlowModel {
        fn name(&self) -> &str {
            "slow"
        }

        async fn send_message(&self, _: &[Turn], _: &str) -> Result<TextStream, ModelError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(text_stream(["10 miles"]))
        }
    }

    /// Yields a fragment, then fails mid-stream.
    struct BrokenStreamModel;

    #[async_trait::async_trait]
    impl ChatModel for BrokenStreamModel {
        fn name(&self) -> &str {
            "broken"
        }

        async fn send_message(&self, _: &[Turn], _: &str) -> Result<TextStream, ModelError> {
            let items = vec![
                Ok("10 miles is ".to_string()),
                Err(ModelError::request("connection reset")),
            ];
            Ok(stream::iter(items).boxed())
        }
    }

    fn gate(model: Arc<dyn ChatModel>) -> ResponseGate {
        ResponseGate::new(model, KeywordSet::builtin())
    }

    #[tokio::test]
    async fn on_topic_reply_is_returned_verbatim() {
        let gate = gate(ScriptedModel::new(vec!["10 miles is 16.09 kilometers"]));
        let mut transcript = Transcript::new();

        let outcome = gate.get_response(&mut transcript, "convert 10 miles").await;

        assert_eq!(outcome, GateOutcome::Answer("10 miles is 16.09 kilometers".into()));
        assert_eq!(outcome.display_text(), "10 miles is 16.09 kilometers");
        assert_eq!(outcome.kind(), ExchangeKind::Answer);
    }

    #[tokio::test]
    async fn off_topic_reply_becomes_refusal() {
        let gate = gate(ScriptedModel::new(vec!["The weather is sunny"]));
        let mut transcript = Transcript::new();

        let outcome = gate.get_response(&mut transcript, "weather?").await;

        assert_eq!(
            outcome,
            GateOutcome::Refused {
                reply: "The weather is sunny".into()
            }
        );
        assert_eq!(outcome.display_text(), REFUSAL_MESSAGE);
        assert_eq!(outcome.kind(), ExchangeKind::Refused);
    }

    #[tokio::test]
    async fn keyword_match_ignores_case_but_keeps_original_casing() {
        let gate = gate(ScriptedModel::new(vec!["100 Degrees CELSIUS = 212 °F"]));
        let mut transcript = Transcript::new();

        let outcome = gate.get_response(&mut transcript, "boiling point").await;

        assert_eq!(outcome.display_text(), "100 Degrees CELSIUS = 212 °F");
    }

    #[tokio::test]
    async fn fragments_are_joined_in_arrival_order() {
        let gate = gate(ScriptedModel::new(vec!["5 kilo", "grams is ", "11.02 ", "pounds"]));
        let mut transcript = Transcript::new();

        let outcome = gate.get_response(&mut transcript, "5 kg in lb").await;

        assert_eq!(
            outcome,
            GateOutcome::Answer("5 kilograms is 11.02 pounds".into())
        );
    }

    #[tokio::test]
    async fn keyword_split_across_fragments_still_matches() {
        let gate = gate(ScriptedModel::new(vec!["about 3 mi", "les"]));
        let mut transcript = Transcript::new();

        let outcome = gate.get_response(&mut transcript, "5 km").await;

        assert!(matches!(outcome, GateOutcome::Answer(_)));
    }

    #[tokio::test]
    async fn transcript_grows_and_is_sent_on_next_call() {
        let model = ScriptedModel::new(vec!["1 mile is 1.609 kilometers"]);
        let gate = gate(model.clone());
        let mut transcript = Transcript::new();

        gate.get_response(&mut transcript, "convert 1 mile").await;
        gate.get_response(&mut transcript, "and back?").await;

        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript.turns()[0], Turn::user("convert 1 mile"));
        assert_eq!(transcript.turns()[1], Turn::model("1 mile is 1.609 kilometers"));
        assert_eq!(*model.seen_history.lock().unwrap(), vec![0, 2]);
    }

    #[tokio::test]
    async fn refused_reply_still_extends_transcript() {
        let gate = gate(ScriptedModel::new(vec!["Sunny today"]));
        let mut transcript = Transcript::new();

        gate.get_response(&mut transcript, "weather").await;

        assert_eq!(transcript.turns()[1], Turn::model("Sunny today"));
    }

    #[tokio::test]
    async fn remote_failure_becomes_error_text() {
        let gate = gate(Arc::new(FailingModel(ModelError::Status {
            status: 429,
            body: "quota exceeded".into(),
        })));
        let mut transcript = Transcript::new();

        let outcome = gate.get_response(&mut transcript, "convert 1 kg").await;

        assert!(outcome.is_failure());
        assert_eq!(outcome.kind(), ExchangeKind::Error);
        assert_eq!(
            outcome.display_text(),
            "Error: model API returned 429: quota exceeded"
        );
        assert!(transcript.is_empty());
    }

    #[tokio::test]
    async fn timeout_becomes_error_text() {
        let gate = gate(Arc::new(SlowModel)).with_timeout(Duration::from_millis(50));
        let mut transcript = Transcript::new();

        let outcome = gate.get_response(&mut transcript, "convert 10 miles").await;

        assert!(matches!(outcome, GateOutcome::Failed(ModelError::Timeout(_))));
        assert!(outcome.display_text().starts_with(ERROR_PREFIX));
        assert!(transcript.is_empty());
    }

    #[tokio::test]
    async fn mid_stream_failure_discards_partial_reply() {
        let gate = gate(Arc::new(BrokenStreamModel));
        let mut transcript = Transcript::new();

        let outcome = gate.get_response(&mut transcript, "convert 10 miles").await;

        assert_eq!(
            outcome,
            GateOutcome::Failed(ModelError::request("connection reset"))
        );
        assert!(transcript.is_empty());
    }

    #[tokio::test]
    async fn collect_fragments_of_empty_stream_is_empty_string() {
        let reply = collect_fragments(text_stream(Vec::<String>::new())).await.unwrap();
        assert!(reply.is_empty());
    }
}
