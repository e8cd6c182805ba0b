//! Database schema SQL for the vector index.

/// Index tables: entries plus their quantized embeddings.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    key TEXT PRIMARY KEY,
    record_id TEXT NOT NULL,
    category TEXT NOT NULL,
    subreddit TEXT NOT NULL,
    keywords TEXT NOT NULL,
    sentiment TEXT NOT NULL,
    text TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entries_category ON entries(category);
CREATE INDEX IF NOT EXISTS idx_entries_record ON entries(record_id);

CREATE TABLE IF NOT EXISTS entry_embeddings (
    entry_key TEXT PRIMARY KEY REFERENCES entries(key) ON DELETE CASCADE,
    embedding BLOB NOT NULL,
    scale REAL NOT NULL,
    offset_val REAL NOT NULL
);
"#;
