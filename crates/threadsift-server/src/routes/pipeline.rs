//! Pipeline streaming routes: run a stage as a subprocess and forward its
//! line-buffered stdout to the browser as server-sent events.

use std::convert::Infallible;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::Router;
use futures::Stream;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::info;

use crate::stages;
use crate::state::AppState;

type SseStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stream/full", get(stream_full))
        .route("/stream/{step}", get(stream_step))
}

/// GET /api/stream/{step} — run one stage and stream its output.
async fn stream_step(
    State(_state): State<Arc<AppState>>,
    Path(step): Path<String>,
) -> Result<Sse<SseStream>, (StatusCode, &'static str)> {
    if !stages::is_stage(&step) {
        return Err((StatusCode::BAD_REQUEST, "Invalid step"));
    }

    info!("Streaming stage: {}", step);
    let stream: SseStream = Box::pin(async_stream::stream! {
        for await event in run_stage_events(step.clone()) {
            yield Ok::<_, Infallible>(event);
        }
        yield Ok(Event::default().data("Step finished."));
        yield Ok(Event::default().event("close").data("done"));
    });
    Ok(Sse::new(stream))
}

/// GET /api/stream/full — run the whole pipeline (evaluation excluded).
async fn stream_full(State(_state): State<Arc<AppState>>) -> Sse<SseStream> {
    info!("Streaming full pipeline run");
    let stream: SseStream = Box::pin(async_stream::stream! {
        for step in stages::FULL_RUN_STAGES {
            yield Ok::<_, Infallible>(
                Event::default().data(format!("===== Starting {} =====", step.to_uppercase())),
            );
            for await event in run_stage_events(step.to_string()) {
                yield Ok(event);
            }
            yield Ok(Event::default().data(format!("===== Finished {} =====", step.to_uppercase())));
        }
        yield Ok(Event::default().data("Full pipeline completed."));
        yield Ok(Event::default().event("close").data("done"));
    });
    Sse::new(stream)
}

/// Spawn `threadsift <step>` and yield one event per stdout line.
fn run_stage_events(step: String) -> impl Stream<Item = Event> {
    async_stream::stream! {
        let exe = match std::env::current_exe() {
            Ok(exe) => exe,
            Err(e) => {
                yield Event::default().data(format!("Failed to locate binary: {}", e));
                return;
            }
        };

        let mut child = match Command::new(exe)
            .arg(&step)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                yield Event::default().data(format!("Failed to start {}: {}", step, e));
                return;
            }
        };

        let Some(stdout) = child.stdout.take() else {
            yield Event::default().data("No output handle for stage process".to_string());
            return;
        };

        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            yield Event::default().data(line);
        }

        match child.wait().await {
            Ok(status) if !status.success() => {
                yield Event::default().data(format!("Stage {} exited with {}", step, status));
            }
            Err(e) => {
                yield Event::default().data(format!("Stage {} failed: {}", step, e));
            }
            _ => {}
        }
    }
}
