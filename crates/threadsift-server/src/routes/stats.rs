//! Stats route: index state plus per-stage dataset sizes.

use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/stats", get(get_stats))
}

/// GET /api/stats — index statistics and dataset row counts.
async fn get_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let index_stats = state.index.stats().ok();
    let paths = &state.config.data_paths;

    Json(serde_json::json!({
        "index": {
            "entries": index_stats.as_ref().map(|s| s.entries).unwrap_or(0),
            "embeddings": index_stats.as_ref().map(|s| s.embeddings).unwrap_or(0),
            "embeddingDimension": state.config.embedding_dim,
            "dbSizeMb": index_stats.as_ref().map(|s| s.db_size_mb).unwrap_or(0.0),
            "embedderAvailable": state.embedder.is_available(),
        },
        "datasets": {
            "raw": count_rows(&paths.raw_csv),
            "clean": count_rows(&paths.clean_csv),
            "sentiment": count_rows(&paths.sentiment_csv),
            "evaluation": count_rows(&paths.evaluation_csv),
        },
    }))
}

/// Data rows in a stage CSV, or null when the stage has not run.
fn count_rows(path: &Path) -> Option<usize> {
    if !path.exists() {
        return None;
    }
    csv::Reader::from_path(path)
        .ok()
        .map(|mut reader| reader.records().filter_map(|r| r.ok()).count())
}
