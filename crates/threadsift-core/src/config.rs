//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths to all ThreadSift data files and directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Raw scraped records (`data/reddit_data.csv`).
    pub raw_csv: PathBuf,
    /// Tagged + cleaned records (`data/reddit_data_clean.csv`).
    pub clean_csv: PathBuf,
    /// Sentiment-labeled records (`data/reddit_data_sentiment.csv`).
    pub sentiment_csv: PathBuf,
    /// Evaluation output (`data/evaluation_results.csv`).
    pub evaluation_csv: PathBuf,
    /// Optional evaluation question list (`data/evaluation_questions.txt`).
    pub evaluation_questions: PathBuf,
    /// Vector index directory (`data/index/`).
    pub index_dir: PathBuf,
    /// Optional taxonomy override (`data/taxonomy.json`).
    pub taxonomy_file: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
    /// Embedding model directory (`data/models/`).
    pub model_dir: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            raw_csv: root.join("reddit_data.csv"),
            clean_csv: root.join("reddit_data_clean.csv"),
            sentiment_csv: root.join("reddit_data_sentiment.csv"),
            evaluation_csv: root.join("evaluation_results.csv"),
            evaluation_questions: root.join("evaluation_questions.txt"),
            index_dir: root.join("index"),
            taxonomy_file: root.join("taxonomy.json"),
            llm_config_file: root.join("llm-config.json"),
            model_dir: root.join("models"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.index_dir)?;
        Ok(())
    }
}

/// Top-level ThreadSift configuration.
///
/// Every tunable the pipeline and query path depend on lives here so tests
/// can substitute alternates instead of reaching for process-wide constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data file paths.
    pub data_paths: DataPaths,
    /// Embedding dimension (768 for all-mpnet-base-v2).
    pub embedding_dim: usize,
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters.
    pub chunk_overlap: usize,
    /// Number of matches the retriever returns.
    pub top_k: usize,
    /// Compound score above which a record is labeled positive.
    pub positive_threshold: f64,
    /// Compound score below which a record is labeled negative.
    pub negative_threshold: f64,
}

impl AppConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            embedding_dim: 768,
            chunk_size: 300,
            chunk_overlap: 80,
            top_k: 10,
            positive_threshold: 0.05,
            negative_threshold: -0.05,
        })
    }
}
