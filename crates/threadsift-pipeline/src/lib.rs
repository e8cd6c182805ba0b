//! ThreadSift Pipeline — record model, text normalization, keyword tagging,
//! sentiment labeling, and chunking for the batch stages.

pub mod chunking;
pub mod clean_stage;
pub mod normalize;
pub mod records;
pub mod sentiment;
pub mod sentiment_stage;
pub mod tagger;
pub mod taxonomy;

pub use chunking::{OverlapChunker, TextChunk};
pub use records::{Record, RecordKind, SentimentRecord, TaggedRecord};
pub use sentiment::{SentimentAnalyzer, SentimentLabel};
pub use tagger::Tagger;
pub use taxonomy::Taxonomy;
