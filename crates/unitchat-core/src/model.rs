//! Seam between the gate and whatever produces replies (live API or mock).

use futures_util::stream::{self, BoxStream, StreamExt};

use crate::conversation::Turn;
use crate::error::ModelError;

/// Finite, ordered sequence of reply fragments. Restartable only by re-issuing the call.
pub type TextStream = BoxStream<'static, Result<String, ModelError>>;

/// Trait implemented by every chat backend.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    /// Backend name for logs and the status endpoint.
    fn name(&self) -> &str;

    /// Sends `message` with the prior `history` and returns the reply as a fragment stream.
    ///
    /// Errors raised before the first fragment come back as `Err`; errors while streaming
    /// arrive as an `Err` item.
    async fn send_message(&self, history: &[Turn], message: &str)
        -> Result<TextStream, ModelError>;
}

/// Stream over already-known fragments.
pub fn text_stream<I, S>(fragments: I) -> TextStream
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let items: Vec<Result<String, ModelError>> =
        fragments.into_iter().map(|f| Ok(f.into())).collect();
    stream::iter(items).boxed()
}
