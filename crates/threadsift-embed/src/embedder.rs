//! Embedding engine trait and implementations.
//!
//! The `EmbedderBackend` trait abstracts over embedding generation.
//! Implementations:
//! - `OnnxEmbedder`: ONNX Runtime with all-mpnet-base-v2 (requires the `onnx` feature)
//! - `NoopEmbedder`: returns None to signal no embeddings available

use ndarray::Array1;

/// Embedding dimension of all-mpnet-base-v2.
pub const EMBEDDING_DIM: usize = 768;

/// Result of an embedding operation.
pub struct EmbeddingResult {
    /// Float32 embedding vector (768-dim for all-mpnet-base-v2).
    pub embedding: Array1<f32>,
    /// Whether this was served from cache.
    pub cached: bool,
}

/// Trait for embedding backends.
pub trait EmbedderBackend: Send + Sync {
    /// Generate an embedding for a text string.
    /// Returns None if the embedder is not available.
    fn embed(&self, text: &str) -> Option<EmbeddingResult>;

    /// Generate embeddings for a batch of texts.
    fn embed_batch(&self, texts: &[&str]) -> Vec<Option<EmbeddingResult>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Check if the embedder is available (model loaded).
    fn is_available(&self) -> bool;
}

/// Placeholder embedder that always returns None.
pub struct NoopEmbedder {
    dim: usize,
}

impl NoopEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl EmbedderBackend for NoopEmbedder {
    fn embed(&self, _text: &str) -> Option<EmbeddingResult> {
        None
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_is_unavailable() {
        let embedder = NoopEmbedder::new(EMBEDDING_DIM);
        assert!(!embedder.is_available());
        assert!(embedder.embed("anything").is_none());
        assert_eq!(embedder.dimension(), 768);
    }
}
