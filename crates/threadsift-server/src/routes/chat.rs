//! Chat route: category-aware retrieval plus answer composition.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::state::AppState;
use threadsift_chat::types::ChatRequest;
use threadsift_chat::ContextPassage;
use threadsift_retrieve::{FilteredRetriever, RetrieveError};

/// Fixed reply when the index stage has never been run.
pub const INDEX_MISSING_MESSAGE: &str =
    "Vector index not found. Please run the index step first.";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat))
}

/// POST /api/chat — plain-text answer for a free-text question.
async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> String {
    let question = req.message;

    let filter = state.router.route(&question);
    info!("Chat question routed to filter {:?}", filter);

    let retriever =
        FilteredRetriever::new(&state.index, state.embedder.as_ref(), state.config.top_k);

    let hits = match retriever.retrieve(&question, filter) {
        Ok(hits) => hits,
        Err(RetrieveError::IndexUnavailable) => return INDEX_MISSING_MESSAGE.to_string(),
        Err(e) => return format!("Error during retrieval: {}", e),
    };

    let passages: Vec<ContextPassage> = hits
        .iter()
        .map(|hit| ContextPassage {
            text: hit.text.clone(),
            subreddit: hit.subreddit.clone(),
            category: hit.category.to_string(),
        })
        .collect();

    let llm = state.llm.resolve_provider();
    let llm_ref = llm
        .as_ref()
        .map(|(provider, model, key)| (*provider, model.as_str(), key.as_str()));

    match state
        .composer
        .compose(&state.http, llm_ref, &question, &passages)
        .await
    {
        Ok(answer) => answer.text,
        Err(e) => format!("Error during generation: {}", e),
    }
}
