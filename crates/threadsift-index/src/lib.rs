//! ThreadSift Index — SQLite-backed vector index with int8-quantized
//! embeddings and category-filtered cosine similarity search.

pub mod index;
pub mod quantize;
pub mod schema;

pub use index::{IndexEntry, IndexHit, IndexStats, NewEntry, VectorIndex, INDEX_FILE_NAME};
pub use quantize::{dequantize_uint8, quantize_uint8};
