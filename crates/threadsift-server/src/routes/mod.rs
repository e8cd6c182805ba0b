//! HTTP route handlers.

pub mod chat;
pub mod pipeline;
pub mod results;
pub mod stats;

use std::sync::Arc;

use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_page))
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(pipeline::routes())
        .merge(chat::routes())
        .merge(results::routes())
        .merge(stats::routes())
}

/// Embedded single-page UI.
async fn index_page() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}
