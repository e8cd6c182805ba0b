//! Sentiment stage: label cleaned records, summarize negative mentions.

use std::collections::HashMap;

use tracing::info;

use threadsift_core::{DataPaths, Error, Result};

use crate::normalize::normalize;
use crate::records::{self, SentimentRecord, TaggedRecord};
use crate::sentiment::{top_bigrams, top_unigrams, SentimentAnalyzer, SentimentLabel};

/// What the sentiment stage produced, for logging and tests.
#[derive(Debug, Clone)]
pub struct SentimentSummary {
    pub rows: usize,
    pub distribution: Vec<(SentimentLabel, usize)>,
    pub negative_unigrams: Vec<(String, usize)>,
    pub negative_bigrams: Vec<(String, usize)>,
}

/// Run the sentiment stage: read the clean CSV, label each row by its
/// compound polarity score, overwrite the sentiment CSV, and log the label
/// distribution plus a frequency summary of negative mentions.
pub fn run(paths: &DataPaths, analyzer: &SentimentAnalyzer) -> Result<SentimentSummary> {
    if !paths.clean_csv.exists() {
        return Err(Error::NotFound(format!(
            "clean dataset {} (run the clean step first)",
            paths.clean_csv.display()
        )));
    }

    info!("Loading clean dataset from {}", paths.clean_csv.display());
    let tagged: Vec<TaggedRecord> = records::load_csv(&paths.clean_csv)?;

    let mut labeled = Vec::with_capacity(tagged.len());
    for row in tagged {
        // Re-normalizing is idempotent; it guards against stray "nan" tokens
        // in files produced by older runs.
        let clean_text = normalize(&row.clean_text);
        let label = analyzer.label(&clean_text);
        labeled.push(SentimentRecord {
            id: row.id,
            category: row.category,
            subreddit: row.subreddit,
            full_text: row.full_text,
            keywords_found: row.keywords_found,
            clean_text,
            sentiment: label.as_str().to_string(),
        });
    }

    records::save_csv(&paths.sentiment_csv, &labeled)?;
    info!(
        "Saved {} sentiment-labeled rows to {}",
        labeled.len(),
        paths.sentiment_csv.display()
    );

    let summary = summarize(&labeled);
    log_summary(&summary);
    Ok(summary)
}

fn summarize(rows: &[SentimentRecord]) -> SentimentSummary {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        *counts.entry(row.sentiment.as_str()).or_insert(0) += 1;
    }

    let distribution = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
    ]
    .iter()
    .map(|label| (*label, counts.get(label.as_str()).copied().unwrap_or(0)))
    .collect();

    // Pain points come from negative rows only; informational output, nothing
    // downstream consumes it.
    let negative_texts: Vec<&str> = rows
        .iter()
        .filter(|r| r.sentiment == SentimentLabel::Negative.as_str())
        .map(|r| r.clean_text.as_str())
        .collect();

    SentimentSummary {
        rows: rows.len(),
        distribution,
        negative_unigrams: top_unigrams(&negative_texts, 20),
        negative_bigrams: top_bigrams(&negative_texts, 20),
    }
}

fn log_summary(summary: &SentimentSummary) {
    info!("Sentiment distribution:");
    for (label, count) in &summary.distribution {
        info!("  {:<9} {}", label.as_str(), count);
    }
    info!("Top words in negative mentions:");
    for (word, count) in &summary.negative_unigrams {
        info!("  {:<24} {}", word, count);
    }
    info!("Top word pairs in negative mentions:");
    for (pair, count) in &summary.negative_bigrams {
        info!("  {:<32} {}", pair, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{keyword_list_to_cell, RecordKind};
    use crate::records::{Record, TaggedRecord};
    use chrono::{TimeZone, Utc};
    use threadsift_core::Category;

    fn tagged(id: &str, clean_text: &str, keyword: &str) -> TaggedRecord {
        let base = Record {
            id: id.into(),
            category: Category::Tech,
            subreddit: "sysadmin".into(),
            title: None,
            content: Some(clean_text.into()),
            author: "author".into(),
            score: 0,
            num_comments: None,
            created_utc: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            edited: false,
            kind: RecordKind::Comment,
            parent_id: Some("t3_parent".into()),
        };
        TaggedRecord {
            id: base.id.clone(),
            category: base.category,
            subreddit: base.subreddit.clone(),
            title: base.title.clone(),
            content: base.content.clone(),
            author: base.author.clone(),
            score: base.score,
            num_comments: base.num_comments,
            created_utc: base.created_utc,
            edited: base.edited,
            kind: base.kind,
            parent_id: base.parent_id.clone(),
            full_text: clean_text.into(),
            keywords_found: keyword_list_to_cell(&[keyword.to_string()]),
            software_flag: true,
            clean_text: clean_text.into(),
        }
    }

    #[test]
    fn test_stage_labels_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path()).unwrap();
        records::save_csv(
            &paths.clean_csv,
            &[
                tagged("a", "docker is great and really reliable", "docker"),
                tagged("b", "splunk licensing is a frustrating nightmare", "splunk"),
                tagged("c", "we migrated the aws account yesterday", "aws"),
            ],
        )
        .unwrap();

        let summary = run(&paths, &SentimentAnalyzer::default()).unwrap();
        assert_eq!(summary.rows, 3);

        let by_label: std::collections::HashMap<_, _> =
            summary.distribution.iter().cloned().collect();
        assert_eq!(by_label[&SentimentLabel::Positive], 1);
        assert_eq!(by_label[&SentimentLabel::Negative], 1);
        assert_eq!(by_label[&SentimentLabel::Neutral], 1);

        let rows: Vec<SentimentRecord> = records::load_csv(&paths.sentiment_csv).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().any(|r| r.sentiment == "negative"));
    }

    #[test]
    fn test_pain_points_from_negative_rows_only() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path()).unwrap();
        records::save_csv(
            &paths.clean_csv,
            &[
                tagged("a", "the sync agent keeps crashing terrible tool", "jira"),
                tagged("b", "love the new dashboard great work", "jira"),
            ],
        )
        .unwrap();

        let summary = run(&paths, &SentimentAnalyzer::default()).unwrap();
        let words: Vec<&str> = summary
            .negative_unigrams
            .iter()
            .map(|(w, _)| w.as_str())
            .collect();
        assert!(words.contains(&"crashing"));
        assert!(!words.contains(&"dashboard"));
    }

    #[test]
    fn test_missing_input_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path()).unwrap();
        let result = run(&paths, &SentimentAnalyzer::default());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
