//! Shared application state.

use std::sync::Arc;

use threadsift_chat::{AnswerComposer, LLMConfig};
use threadsift_core::AppConfig;
use threadsift_embed::EmbedderBackend;
use threadsift_index::VectorIndex;
use threadsift_retrieve::CategoryRouter;

/// Shared application state accessible from all route handlers.
///
/// The chat path is stateless per request: nothing here is mutated after
/// startup, so concurrent questions need no locking.
pub struct AppState {
    pub config: AppConfig,
    pub index: VectorIndex,
    pub embedder: Arc<dyn EmbedderBackend>,
    pub llm: LLMConfig,
    pub router: CategoryRouter,
    pub composer: AnswerComposer,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        index: VectorIndex,
        embedder: Arc<dyn EmbedderBackend>,
        llm: LLMConfig,
    ) -> Self {
        Self {
            config,
            index,
            embedder,
            llm,
            router: CategoryRouter::default(),
            composer: AnswerComposer::default(),
            http: reqwest::Client::new(),
        }
    }
}
