//! Evaluation results route.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::stages::EvaluationRow;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/results", get(get_results))
}

/// GET /api/results — evaluation rows as JSON, or a structured 404 when the
/// evaluation stage has not produced anything yet.
async fn get_results(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<serde_json::Value>>, (StatusCode, Json<serde_json::Value>)> {
    let path = &state.config.data_paths.evaluation_csv;
    if !path.exists() {
        return Err(not_found("No evaluation results found. Run evaluation first."));
    }

    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        not_found(&format!("Failed to load evaluation results: {}", e))
    })?;

    let rows: Vec<EvaluationRow> = reader.deserialize().filter_map(|r| r.ok()).collect();
    if rows.is_empty() {
        return Err(not_found("Evaluation file is empty."));
    }

    let records = rows
        .into_iter()
        .map(|row| {
            serde_json::json!({
                "question": row.question,
                "rag_answer": row.rag_answer,
                "llm_answer": row.llm_only_answer,
                "rag_relevance": row.rag_relevance,
                "llm_relevance": row.llm_relevance,
            })
        })
        .collect();

    Ok(Json(records))
}

fn not_found(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": message })),
    )
}
