//! SQLite-backed vector index with category-filtered cosine search.
//!
//! Entries are keyed by an opaque UUID and carry the metadata record
//! `{record_id, category, subreddit, keywords, sentiment}` alongside the
//! chunk text. Embeddings are stored int8-quantized and served from an
//! in-memory row-normalized matrix, so a search is one dot product.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ndarray::{Array1, Array2};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use threadsift_core::{Category, Error, Result};

use crate::quantize::{dequantize_uint8, quantize_uint8};
use crate::schema::SCHEMA_SQL;

/// File name of the index database inside its directory.
pub const INDEX_FILE_NAME: &str = "reddit-insights.db";

/// Metadata and text for a new entry; the key is generated on insert.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub record_id: String,
    pub category: Category,
    pub subreddit: String,
    /// Comma-joined keyword list.
    pub keywords: String,
    pub sentiment: String,
    pub text: String,
}

/// A stored entry read back from the index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexEntry {
    pub key: String,
    pub record_id: String,
    pub category: Category,
    pub subreddit: String,
    pub keywords: String,
    pub sentiment: String,
    pub text: String,
    pub created_at: i64,
}

/// A similarity-search match.
#[derive(Debug, Clone, Serialize)]
pub struct IndexHit {
    pub key: String,
    pub record_id: String,
    pub category: Category,
    pub subreddit: String,
    pub keywords: String,
    pub sentiment: String,
    pub text: String,
    pub score: f64,
}

/// Index-level statistics.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub entries: i64,
    pub embeddings: i64,
    pub embedding_dimension: usize,
    pub db_path: String,
    pub db_size_mb: f64,
    pub matrix_rows: usize,
}

struct EmbeddingMatrix {
    /// Normalized embeddings, shape (N, dim).
    matrix: Array2<f32>,
    /// Entry keys corresponding to each row.
    keys: Vec<String>,
    /// Category per row, for filtered search without a table scan.
    categories: Vec<Category>,
    /// Whether the matrix needs reloading.
    dirty: bool,
}

/// SQLite-backed cosine-similarity vector index.
pub struct VectorIndex {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    embedding_dim: usize,
    embedding_matrix: Mutex<EmbeddingMatrix>,
}

impl VectorIndex {
    /// Open or create the index.
    ///
    /// `db_dir` is the directory (e.g., `data/index/`); the database file is
    /// `db_dir/reddit-insights.db`.
    pub fn open(db_dir: impl AsRef<Path>, embedding_dim: usize) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join(INDEX_FILE_NAME);

        let conn = Self::create_connection(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let index = Self {
            conn: Mutex::new(conn),
            db_path,
            embedding_dim,
            embedding_matrix: Mutex::new(EmbeddingMatrix {
                matrix: Array2::zeros((0, embedding_dim)),
                keys: Vec::new(),
                categories: Vec::new(),
                dirty: true,
            }),
        };

        index.load_embedding_matrix()?;

        let entry_count = index.count_entries()?;
        info!(
            "VectorIndex opened: {} entries, dim={}, path={}",
            entry_count,
            embedding_dim,
            index.db_path.display()
        );

        Ok(index)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    // ---------------------------------------------------------------
    // Entry CRUD
    // ---------------------------------------------------------------

    /// Insert an entry under a fresh opaque key. Returns the key.
    pub fn add_entry(&self, entry: &NewEntry) -> Result<String> {
        let key = Uuid::new_v4().to_string();
        let now = now_millis();

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO entries (key, record_id, category, subreddit, keywords, sentiment, text, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            key,
            entry.record_id,
            entry.category.as_str(),
            entry.subreddit,
            entry.keywords,
            entry.sentiment,
            entry.text,
            now,
        ])
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(key)
    }

    /// Get an entry by key.
    pub fn get_entry(&self, key: &str) -> Result<Option<IndexEntry>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM entries WHERE key = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![key], |row| Ok(Self::row_to_entry(row)))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row.flatten())
    }

    /// Count stored entries.
    pub fn count_entries(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Count stored embeddings. Zero means the index has not been built.
    pub fn count_embeddings(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM entry_embeddings", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Remove every entry and embedding; used when a stage rebuilds the
    /// index wholesale.
    pub fn clear(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM entries", [])
            .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute("DELETE FROM entry_embeddings", [])
            .map_err(|e| Error::Database(e.to_string()))?;
        drop(conn);

        let mut mat = self.embedding_matrix.lock();
        mat.matrix = Array2::zeros((0, self.embedding_dim));
        mat.keys.clear();
        mat.categories.clear();
        mat.dirty = false;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Embeddings
    // ---------------------------------------------------------------

    /// Store a quantized embedding for an entry.
    pub fn add_embedding(&self, key: &str, embedding: &Array1<f32>) -> Result<()> {
        if embedding.len() != self.embedding_dim {
            return Err(Error::Index(format!(
                "embedding dimension {} does not match index dimension {}",
                embedding.len(),
                self.embedding_dim
            )));
        }
        let (q_bytes, scale, offset) = quantize_uint8(embedding);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO entry_embeddings (entry_key, embedding, scale, offset_val) \
             VALUES (?1, ?2, ?3, ?4)",
            params![key, q_bytes, scale, offset],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        drop(conn);
        self.embedding_matrix.lock().dirty = true;
        Ok(())
    }

    /// Load and normalize all embeddings into the in-memory matrix.
    fn load_embedding_matrix(&self) -> Result<()> {
        let mut keys = Vec::new();
        let mut categories = Vec::new();
        let mut embeddings: Vec<Array1<f32>> = Vec::new();

        {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare(
                    "SELECT ee.entry_key, ee.embedding, ee.scale, ee.offset_val, e.category \
                     FROM entry_embeddings ee \
                     JOIN entries e ON e.key = ee.entry_key",
                )
                .map_err(|e| Error::Database(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    let key: String = row.get(0)?;
                    let blob: Vec<u8> = row.get(1)?;
                    let scale: f64 = row.get(2)?;
                    let offset: f64 = row.get(3)?;
                    let category: String = row.get(4)?;
                    Ok((key, blob, scale as f32, offset as f32, category))
                })
                .map_err(|e| Error::Database(e.to_string()))?;

            for row in rows {
                let (key, blob, scale, offset, category) =
                    row.map_err(|e| Error::Database(e.to_string()))?;
                let Ok(category) = Category::from_str(&category) else {
                    continue;
                };
                keys.push(key);
                categories.push(category);
                embeddings.push(dequantize_uint8(&blob, scale, offset));
            }
        }

        let mut mat = self.embedding_matrix.lock();
        if embeddings.is_empty() {
            mat.matrix = Array2::zeros((0, self.embedding_dim));
            mat.keys = Vec::new();
            mat.categories = Vec::new();
            mat.dirty = false;
            return Ok(());
        }

        let n = embeddings.len();
        let dim = self.embedding_dim;
        let mut matrix = Array2::zeros((n, dim));
        for (i, emb) in embeddings.iter().enumerate() {
            matrix.row_mut(i).assign(emb);
        }

        // Normalize rows so cosine similarity becomes a dot product.
        for mut row in matrix.rows_mut() {
            let norm = row.dot(&row).sqrt();
            if norm > 1e-9 {
                row /= norm;
            }
        }

        mat.matrix = matrix;
        mat.keys = keys;
        mat.categories = categories;
        mat.dirty = false;
        debug!("Loaded {} embeddings into matrix", n);
        Ok(())
    }

    /// Reload the matrix when it is marked dirty or when another process has
    /// changed the number of stored embeddings (the index stage rebuilds the
    /// database as a subprocess of the server). A rebuild that lands on the
    /// identical row count is not detected until restart.
    fn ensure_matrix_loaded(&self) -> Result<()> {
        let stored = self.count_embeddings()?;
        let stale = {
            let mat = self.embedding_matrix.lock();
            mat.dirty || mat.matrix.nrows() as i64 != stored
        };
        if stale {
            self.load_embedding_matrix()?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Search
    // ---------------------------------------------------------------

    /// Cosine similarity search, optionally restricted to one category.
    ///
    /// The filter is applied before ranking, so the top-k is taken over the
    /// restricted candidate set, ordered by descending similarity.
    pub fn search(
        &self,
        query_embedding: &Array1<f32>,
        top_k: usize,
        filter: Option<Category>,
    ) -> Result<Vec<IndexHit>> {
        self.ensure_matrix_loaded()?;

        let mat = self.embedding_matrix.lock();
        if mat.matrix.nrows() == 0 {
            return Ok(Vec::new());
        }

        let q_norm = query_embedding.dot(query_embedding).sqrt();
        if q_norm < 1e-9 {
            return Ok(Vec::new());
        }
        let q = query_embedding / q_norm;

        // (N, dim) @ (dim,) → (N,)
        let similarities = mat.matrix.dot(&q);

        let mut candidates: Vec<(usize, f32)> = similarities
            .iter()
            .enumerate()
            .filter(|(i, _)| filter.map(|c| mat.categories[*i] == c).unwrap_or(true))
            .map(|(i, &s)| (i, s))
            .collect();
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(top_k);

        let top_keys: Vec<(String, f64)> = candidates
            .iter()
            .map(|&(i, s)| (mat.keys[i].clone(), s as f64))
            .collect();
        drop(mat);

        let mut hits = Vec::with_capacity(top_keys.len());
        for (key, score) in top_keys {
            if let Some(entry) = self.get_entry(&key)? {
                hits.push(IndexHit {
                    key: entry.key,
                    record_id: entry.record_id,
                    category: entry.category,
                    subreddit: entry.subreddit,
                    keywords: entry.keywords,
                    sentiment: entry.sentiment,
                    text: entry.text,
                    score,
                });
            }
        }
        Ok(hits)
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    /// Get index statistics.
    pub fn stats(&self) -> Result<IndexStats> {
        let entries = self.count_entries()?;
        let embeddings = self.count_embeddings()?;

        let db_size = std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0);
        let matrix_rows = self.embedding_matrix.lock().matrix.nrows();

        Ok(IndexStats {
            entries,
            embeddings,
            embedding_dimension: self.embedding_dim,
            db_path: self.db_path.to_string_lossy().to_string(),
            db_size_mb: db_size as f64 / (1024.0 * 1024.0),
            matrix_rows,
        })
    }

    // ---------------------------------------------------------------
    // Row mapping
    // ---------------------------------------------------------------

    fn row_to_entry(row: &rusqlite::Row<'_>) -> Option<IndexEntry> {
        let category: String = row.get("category").ok()?;
        Some(IndexEntry {
            key: row.get("key").ok()?,
            record_id: row.get("record_id").ok()?,
            category: Category::from_str(&category).ok()?,
            subreddit: row.get("subreddit").ok()?,
            keywords: row.get("keywords").ok()?,
            sentiment: row.get("sentiment").ok()?,
            text: row.get("text").ok()?,
            created_at: row.get("created_at").ok()?,
        })
    }
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DIM: usize = 8;

    fn test_index() -> (VectorIndex, TempDir) {
        let dir = TempDir::new().unwrap();
        let index = VectorIndex::open(dir.path(), DIM).unwrap();
        (index, dir)
    }

    fn entry(category: Category, text: &str) -> NewEntry {
        NewEntry {
            record_id: "t3_x".into(),
            category,
            subreddit: "testsub".into(),
            keywords: "procore".into(),
            sentiment: "neutral".into(),
            text: text.into(),
        }
    }

    fn vec_with(dim_hot: usize) -> Array1<f32> {
        let mut v = Array1::zeros(DIM);
        v[dim_hot] = 1.0;
        v[(dim_hot + 1) % DIM] = 0.4;
        v
    }

    #[test]
    fn test_add_and_get_entry() {
        let (index, _dir) = test_index();
        let key = index
            .add_entry(&entry(Category::Construction, "procore on site"))
            .unwrap();
        let stored = index.get_entry(&key).unwrap().unwrap();
        assert_eq!(stored.text, "procore on site");
        assert_eq!(stored.category, Category::Construction);
        assert_eq!(stored.key, key);
    }

    #[test]
    fn test_empty_index_search_returns_nothing() {
        let (index, _dir) = test_index();
        let hits = index.search(&vec_with(0), 10, None).unwrap();
        assert!(hits.is_empty());
        assert_eq!(index.count_embeddings().unwrap(), 0);
    }

    #[test]
    fn test_roundtrip_near_duplicate_score() {
        let (index, _dir) = test_index();
        let key = index
            .add_entry(&entry(Category::Tech, "we love our aws setup"))
            .unwrap();
        let v = vec_with(2);
        index.add_embedding(&key, &v).unwrap();

        // Searching with the exact stored vector must surface the entry with
        // a near-duplicate similarity.
        let hits = index.search(&v, 10, None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, key);
        assert!(hits[0].score > 0.99, "score was {}", hits[0].score);
    }

    #[test]
    fn test_category_filter_restricts_results() {
        let (index, _dir) = test_index();
        let construction = index
            .add_entry(&entry(Category::Construction, "procore on site"))
            .unwrap();
        let tech = index
            .add_entry(&entry(Category::Tech, "docker at work"))
            .unwrap();

        index.add_embedding(&construction, &vec_with(0)).unwrap();
        index.add_embedding(&tech, &vec_with(0)).unwrap();

        let hits = index
            .search(&vec_with(0), 10, Some(Category::Construction))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, construction);
        assert!(hits.iter().all(|h| h.category == Category::Construction));
    }

    #[test]
    fn test_results_ranked_descending() {
        let (index, _dir) = test_index();
        let near = index.add_entry(&entry(Category::Tech, "near match")).unwrap();
        let far = index.add_entry(&entry(Category::Tech, "far match")).unwrap();

        index.add_embedding(&near, &vec_with(0)).unwrap();
        index.add_embedding(&far, &vec_with(4)).unwrap();

        let hits = index.search(&vec_with(0), 10, None).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].key, near);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_top_k_truncates() {
        let (index, _dir) = test_index();
        for i in 0..5 {
            let key = index
                .add_entry(&entry(Category::Tech, &format!("entry {}", i)))
                .unwrap();
            index.add_embedding(&key, &vec_with(i % DIM)).unwrap();
        }
        let hits = index.search(&vec_with(0), 3, None).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_clear_empties_index() {
        let (index, _dir) = test_index();
        let key = index.add_entry(&entry(Category::Law, "westlaw notes")).unwrap();
        index.add_embedding(&key, &vec_with(1)).unwrap();
        assert_eq!(index.count_entries().unwrap(), 1);

        index.clear().unwrap();
        assert_eq!(index.count_entries().unwrap(), 0);
        assert_eq!(index.count_embeddings().unwrap(), 0);
        assert!(index.search(&vec_with(1), 10, None).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let (index, _dir) = test_index();
        let key = index.add_entry(&entry(Category::Law, "clio thread")).unwrap();
        let wrong = Array1::zeros(DIM + 1);
        assert!(matches!(
            index.add_embedding(&key, &wrong),
            Err(Error::Index(_))
        ));
    }

    #[test]
    fn test_stats() {
        let (index, _dir) = test_index();
        let key = index.add_entry(&entry(Category::Tech, "stat entry")).unwrap();
        index.add_embedding(&key, &vec_with(0)).unwrap();

        let stats = index.stats().unwrap();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.embeddings, 1);
        assert_eq!(stats.embedding_dimension, DIM);
    }
}
