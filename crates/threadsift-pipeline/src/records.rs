//! Record types for the per-stage CSV files.
//!
//! Column names are part of the contract between stages: each stage reads the
//! previous stage's file by header and writes its own. `keywords_found` is
//! stored as a JSON array string inside its CSV cell.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use threadsift_core::{Category, Result};

/// Whether a row came from a post or one of its comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Post,
    Comment,
}

/// One scraped forum post or comment, as written by the collect stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub category: Category,
    pub subreddit: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    pub author: String,
    pub score: i64,
    #[serde(default)]
    pub num_comments: Option<i64>,
    pub created_utc: DateTime<Utc>,
    pub edited: bool,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl Record {
    /// Title and content joined with a space; missing fields are empty strings.
    pub fn full_text(&self) -> String {
        let title = self.title.as_deref().unwrap_or("");
        let content = self.content.as_deref().unwrap_or("");
        format!("{} {}", title, content).trim().to_string()
    }
}

/// Output row of the clean stage: a relevant record with its matched
/// keywords and normalized text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedRecord {
    pub id: String,
    pub category: Category,
    pub subreddit: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    pub author: String,
    pub score: i64,
    #[serde(default)]
    pub num_comments: Option<i64>,
    pub created_utc: DateTime<Utc>,
    pub edited: bool,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub full_text: String,
    /// JSON array string, e.g. `["aws","docker"]`.
    pub keywords_found: String,
    /// True iff `keywords_found` is non-empty.
    pub software_flag: bool,
    pub clean_text: String,
}

impl TaggedRecord {
    /// Parse the stored keyword list, degrading a malformed cell to a
    /// single-element list holding the raw value.
    pub fn keywords(&self) -> Vec<String> {
        parse_keyword_list(&self.keywords_found)
    }
}

/// Output row of the sentiment stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub id: String,
    pub category: Category,
    pub subreddit: String,
    pub full_text: String,
    pub keywords_found: String,
    pub clean_text: String,
    pub sentiment: String,
}

impl SentimentRecord {
    pub fn keywords(&self) -> Vec<String> {
        parse_keyword_list(&self.keywords_found)
    }
}

/// Parse a JSON-array keyword cell. A cell that fails to parse is kept as a
/// single raw keyword rather than dropping the row.
pub fn parse_keyword_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<String>>(trimmed) {
        Ok(list) => list,
        Err(_) => vec![trimmed.to_string()],
    }
}

/// Serialize a keyword list into its CSV cell form.
pub fn keyword_list_to_cell(keywords: &[String]) -> String {
    serde_json::to_string(keywords).unwrap_or_else(|_| "[]".to_string())
}

/// Load all rows of a stage CSV. A missing file is an empty dataset for the
/// collect stage; other stages treat it as NotFound at the call site.
pub fn load_csv<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Write all rows of a stage CSV, replacing the file wholesale.
pub fn save_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: Option<&str>, content: Option<&str>) -> Record {
        Record {
            id: id.into(),
            category: Category::Tech,
            subreddit: "sysadmin".into(),
            title: title.map(String::from),
            content: content.map(String::from),
            author: "tester".into(),
            score: 3,
            num_comments: Some(1),
            created_utc: Utc::now(),
            edited: false,
            kind: RecordKind::Post,
            parent_id: None,
        }
    }

    #[test]
    fn test_full_text_missing_fields() {
        assert_eq!(record("a", None, Some("body")).full_text(), "body");
        assert_eq!(record("b", Some("head"), None).full_text(), "head");
        assert_eq!(record("c", None, None).full_text(), "");
    }

    #[test]
    fn test_keyword_cell_roundtrip() {
        let keywords = vec!["aws".to_string(), "active directory".to_string()];
        let cell = keyword_list_to_cell(&keywords);
        assert_eq!(parse_keyword_list(&cell), keywords);
    }

    #[test]
    fn test_malformed_keyword_cell_falls_back() {
        assert_eq!(parse_keyword_list("not json"), vec!["not json".to_string()]);
        assert_eq!(parse_keyword_list(""), Vec::<String>::new());
    }

    #[test]
    fn test_csv_roundtrip_preserves_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        save_csv(&path, &[record("t3_abc", Some("hello"), None)]).unwrap();

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with(
            "id,category,subreddit,title,content,author,score,num_comments,created_utc,edited,type,parent_id"
        ));

        let rows: Vec<Record> = load_csv(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "t3_abc");
        assert_eq!(rows[0].kind, RecordKind::Post);
    }
}
