//! ThreadSift Embed — embedding engine and query cache.
//!
//! Provides the `EmbedderBackend` trait for generating embeddings.
//! When the `onnx` feature is enabled and model files are present,
//! `OnnxEmbedder` loads all-mpnet-base-v2 for 768-dim embeddings.
//! Without it, `NoopEmbedder` is used and the index stage reports that
//! no embedding backend is available.

pub mod cache;
pub mod embedder;
pub mod onnx_embedder;

pub use cache::QueryCache;
pub use embedder::{EmbedderBackend, EmbeddingResult, NoopEmbedder, EMBEDDING_DIM};

#[cfg(feature = "onnx")]
pub use onnx_embedder::OnnxEmbedder;

use std::path::Path;
use std::sync::Arc;

/// Create the best available embedder for the given model directory.
///
/// Tries ONNX first (if the feature is enabled and model files are present),
/// falls back to `NoopEmbedder`.
pub fn create_embedder(model_dir: &Path) -> Arc<dyn EmbedderBackend> {
    #[cfg(feature = "onnx")]
    {
        match OnnxEmbedder::load(model_dir) {
            Ok(embedder) => {
                tracing::info!("Using ONNX embedder (dim={})", embedder.dimension());
                return Arc::new(embedder);
            }
            Err(e) => {
                tracing::warn!("ONNX embedder unavailable: {}", e);
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    {
        let _ = model_dir;
        tracing::info!("ONNX feature disabled; no embedding backend loaded.");
    }

    Arc::new(NoopEmbedder::new(EMBEDDING_DIM))
}
