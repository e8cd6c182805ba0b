//! ThreadSift — forum-insights pipeline and RAG chat server in one binary.
//!
//! With a stage name argument it runs that batch stage and exits; with no
//! arguments it serves the web UI, which triggers stages as subprocesses of
//! this same binary and streams their output.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod stages;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("THREADSIFT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let data_dir = resolve_data_dir();

    if args.len() > 1 {
        match args[1].as_str() {
            "serve" => {}
            "--help" | "-h" | "help" => {
                println!("ThreadSift — forum-insights pipeline and RAG chat server");
                println!();
                println!("Usage: threadsift [command]");
                println!();
                println!("Commands:");
                println!("  (none) | serve     Start the web server");
                println!("  collect            Scrape new posts and comments");
                println!("  clean              Tag and filter the raw dataset");
                println!("  sentiment          Label cleaned records by sentiment");
                println!("  index              Chunk, embed, and rebuild the vector index");
                println!("  evaluate           Compare RAG and LLM-only answers");
                println!("  help               Show this help message");
                return Ok(());
            }
            stage if stages::is_stage(stage) => {
                let config = threadsift_core::AppConfig::from_env(&data_dir)?;
                if let Err(e) = stages::run_stage(stage, &config).await {
                    eprintln!("Stage {} failed: {}", stage, e);
                    std::process::exit(1);
                }
                return Ok(());
            }
            other => {
                eprintln!("Unknown command: {}. Use 'threadsift help' for usage.", other);
                std::process::exit(1);
            }
        }
    }

    // Server startup
    info!("Data directory: {}", data_dir.display());

    let config = threadsift_core::AppConfig::from_env(&data_dir)?;
    let port = config.port;

    let index =
        threadsift_index::VectorIndex::open(&config.data_paths.index_dir, config.embedding_dim)
            .map_err(|e| anyhow::anyhow!("Failed to open vector index: {}", e))?;

    let embedder = threadsift_embed::create_embedder(&config.data_paths.model_dir);
    let llm = threadsift_chat::LLMConfig::load(&config.data_paths.llm_config_file);

    let state = Arc::new(AppState::new(config, index, embedder, llm));
    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("ThreadSift server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
