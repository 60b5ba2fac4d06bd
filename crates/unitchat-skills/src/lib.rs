//! Chat model backends: Gemini streaming client, offline mock, and the router between them.

mod gemini;
mod mock;
mod model_router;

pub use gemini::{fragment_stream, GeminiClient};
pub use mock::MockModel;
pub use model_router::ModelRouter;
