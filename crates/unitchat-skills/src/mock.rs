//! Offline chat model: deterministic replies, no network or API key.

use unitchat_core::{text_stream, ChatModel, ModelError, TextStream, Turn};

const MOCK_NAME: &str = "mock";
const PREVIEW_CHARS: usize = 80;
/// Mentions no conversion term, so the gate refuses it.
const OFF_TOPIC_REPLY: &str = "[Mock LLM] That sounds interesting, but I have nothing useful to add.";

/// Answers conversion-looking messages with an echo that passes the gate and everything
/// else with a reply that does not. The reply is streamed word by word.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockModel;

impl MockModel {
    pub fn new() -> Self {
        Self
    }

    fn generate(&self, history: &[Turn], message: &str) -> String {
        let lowered = message.to_lowercase();
        if !(lowered.contains("convert") || lowered.contains(" to ")) {
            return OFF_TOPIC_REPLY.to_string();
        }
        let preview: String = message
            .chars()
            .take(PREVIEW_CHARS)
            .chain(if message.chars().count() > PREVIEW_CHARS { "…" } else { "" }.chars())
            .collect();
        format!(
            "[Mock LLM] Unit conversion requested: {preview} (turn {}). Set llm_mode = \"gemini\" for real results.",
            history.len() / 2 + 1
        )
    }
}

#[async_trait::async_trait]
impl ChatModel for MockModel {
    fn name(&self) -> &str {
        MOCK_NAME
    }

    async fn send_message(&self, history: &[Turn], message: &str) -> Result<TextStream, ModelError> {
        let reply = self.generate(history, message);
        let words: Vec<String> = reply.split_inclusive(' ').map(str::to_string).collect();
        Ok(text_stream(words))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unitchat_core::{collect_fragments, KeywordSet};

    async fn ask(history: &[Turn], message: &str) -> String {
        let model = MockModel::new();
        let stream = model.send_message(history, message).await.unwrap();
        collect_fragments(stream).await.unwrap()
    }

    #[tokio::test]
    async fn conversion_request_gets_on_topic_reply() {
        let reply = ask(&[], "Convert 10 miles to kilometers").await;
        assert!(reply.starts_with("[Mock LLM] Unit conversion requested: Convert 10 miles"));
        assert!(KeywordSet::builtin().matches(&reply));
    }

    #[tokio::test]
    async fn off_topic_reply_has_no_conversion_term() {
        let reply = ask(&[], "What's the weather like?").await;
        assert_eq!(reply, OFF_TOPIC_REPLY);
        assert!(!KeywordSet::builtin().matches(&reply));
    }

    #[tokio::test]
    async fn turn_number_follows_history() {
        let history = [Turn::user("convert 1 mile"), Turn::model("1.6 kilometers")];
        let reply = ask(&history, "and 2 miles to km?").await;
        assert!(reply.contains("(turn 2)"));
    }

    #[tokio::test]
    async fn long_message_is_truncated_in_preview() {
        let message = format!("convert {}", "9".repeat(200));
        let reply = ask(&[], &message).await;
        assert!(reply.contains('…'));
        assert!(reply.len() < message.len() + 120);
    }
}
