//! Similarity retrieval restricted by the router's category filter.

use thiserror::Error;
use tracing::debug;

use threadsift_core::Category;
use threadsift_embed::EmbedderBackend;
use threadsift_index::{IndexHit, VectorIndex};

/// Why a retrieval produced no results.
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// The index holds no embeddings: the index stage has never run.
    #[error("vector index has not been built")]
    IndexUnavailable,

    #[error("embedding failed: {0}")]
    Embedder(String),

    #[error("search failed: {0}")]
    Search(String),
}

/// Top-k similarity retriever over the embedded-chunk index.
pub struct FilteredRetriever<'a> {
    index: &'a VectorIndex,
    embedder: &'a dyn EmbedderBackend,
    top_k: usize,
}

impl<'a> FilteredRetriever<'a> {
    pub fn new(index: &'a VectorIndex, embedder: &'a dyn EmbedderBackend, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }

    /// Retrieve the top matches for `question`, restricted to `filter` when
    /// present, with empty-content matches discarded.
    ///
    /// Errors are returned, never panicked: the caller renders them as a
    /// user-visible message.
    pub fn retrieve(
        &self,
        question: &str,
        filter: Option<Category>,
    ) -> Result<Vec<IndexHit>, RetrieveError> {
        let built = self
            .index
            .count_embeddings()
            .map_err(|e| RetrieveError::Search(e.to_string()))?;
        if built == 0 {
            return Err(RetrieveError::IndexUnavailable);
        }

        let query = self
            .embedder
            .embed(question)
            .ok_or_else(|| RetrieveError::Embedder("no embedding backend available".into()))?;

        let hits = self
            .index
            .search(&query.embedding, self.top_k, filter)
            .map_err(|e| RetrieveError::Search(e.to_string()))?;

        let surviving: Vec<IndexHit> = hits
            .into_iter()
            .filter(|hit| !hit.text.trim().is_empty())
            .collect();

        debug!(
            "Retrieved {} matches for filter {:?}",
            surviving.len(),
            filter
        );
        Ok(surviving)
    }
}
