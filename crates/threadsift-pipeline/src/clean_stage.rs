//! Clean stage: dedup, tag by keyword taxonomy, filter, normalize.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tracing::info;

use threadsift_core::{Category, DataPaths, Error, Result};

use crate::normalize::normalize;
use crate::records::{self, Record, TaggedRecord};
use crate::tagger::Tagger;
use crate::taxonomy::Taxonomy;

/// What the clean stage did, for logging and tests.
#[derive(Debug, Clone)]
pub struct CleanSummary {
    pub input_rows: usize,
    pub kept_rows: usize,
    pub mentions_per_category: Vec<(Category, usize)>,
    pub top_keywords: Vec<(String, usize)>,
    pub top_subreddits: Vec<(String, usize)>,
}

/// Run the clean stage: read the raw CSV, keep the latest copy of each id and
/// of each (title, content) pair, tag records against their own category's
/// terms, drop untagged rows, normalize text, and overwrite the clean CSV.
pub fn run(paths: &DataPaths, taxonomy: &Taxonomy) -> Result<CleanSummary> {
    if !paths.raw_csv.exists() {
        return Err(Error::NotFound(format!(
            "raw dataset {} (run the collect step first)",
            paths.raw_csv.display()
        )));
    }

    info!("Loading raw dataset from {}", paths.raw_csv.display());
    let raw: Vec<Record> = records::load_csv(&paths.raw_csv)?;
    let input_rows = raw.len();

    let deduped = dedup_keep_last(raw);
    info!(
        "{} rows after duplicate removal ({} read)",
        deduped.len(),
        input_rows
    );

    let tagger = Tagger::new(taxonomy)?;
    let mut tagged = Vec::new();
    for record in deduped {
        let full_text = record.full_text();
        let clean_text = normalize(&full_text);
        let keywords = tagger.tag(&clean_text, record.category);
        if !Tagger::is_relevant(&keywords) {
            continue;
        }

        let keyword_list: Vec<String> = keywords.into_iter().collect();
        tagged.push(TaggedRecord {
            id: record.id,
            category: record.category,
            subreddit: record.subreddit,
            title: record.title,
            content: record.content,
            author: record.author,
            score: record.score,
            num_comments: record.num_comments,
            created_utc: record.created_utc,
            edited: record.edited,
            kind: record.kind,
            parent_id: record.parent_id,
            full_text,
            keywords_found: records::keyword_list_to_cell(&keyword_list),
            software_flag: true,
            clean_text,
        });
    }

    records::save_csv(&paths.clean_csv, &tagged)?;
    info!(
        "Saved {} tagged rows to {}",
        tagged.len(),
        paths.clean_csv.display()
    );

    let summary = summarize(input_rows, &tagged);
    log_summary(&summary);
    Ok(summary)
}

/// Keep the most recently scraped version of each id, then of each
/// (title, content) pair, preserving first-seen order.
fn dedup_keep_last(rows: Vec<Record>) -> Vec<Record> {
    let mut by_id: Vec<Record> = Vec::with_capacity(rows.len());
    let mut id_slot: HashMap<String, usize> = HashMap::new();
    for record in rows {
        match id_slot.get(&record.id) {
            Some(&slot) => by_id[slot] = record,
            None => {
                id_slot.insert(record.id.clone(), by_id.len());
                by_id.push(record);
            }
        }
    }

    let mut out: Vec<Record> = Vec::with_capacity(by_id.len());
    let mut text_slot: HashMap<String, usize> = HashMap::new();
    for record in by_id {
        let hash = content_hash(
            record.title.as_deref().unwrap_or(""),
            record.content.as_deref().unwrap_or(""),
        );
        match text_slot.get(&hash) {
            Some(&slot) => out[slot] = record,
            None => {
                text_slot.insert(hash, out.len());
                out.push(record);
            }
        }
    }
    out
}

fn content_hash(title: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

fn summarize(input_rows: usize, tagged: &[TaggedRecord]) -> CleanSummary {
    let mut per_category: HashMap<Category, usize> = HashMap::new();
    let mut keyword_counts: HashMap<String, usize> = HashMap::new();
    let mut subreddit_counts: HashMap<String, usize> = HashMap::new();

    for row in tagged {
        *per_category.entry(row.category).or_insert(0) += 1;
        *subreddit_counts.entry(row.subreddit.clone()).or_insert(0) += 1;
        for keyword in row.keywords() {
            *keyword_counts.entry(keyword).or_insert(0) += 1;
        }
    }

    let mut mentions_per_category: Vec<(Category, usize)> = Category::all()
        .iter()
        .filter_map(|c| per_category.get(c).map(|&n| (*c, n)))
        .collect();
    mentions_per_category.sort_by(|a, b| b.1.cmp(&a.1));

    CleanSummary {
        input_rows,
        kept_rows: tagged.len(),
        mentions_per_category,
        top_keywords: top_n(keyword_counts, 10),
        top_subreddits: top_n(subreddit_counts, 10),
    }
}

fn top_n(counts: HashMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

fn log_summary(summary: &CleanSummary) {
    info!("Software mentions by category:");
    for (category, count) in &summary.mentions_per_category {
        info!("  {:<14} {}", category.as_str(), count);
    }
    info!("Top mentioned tools:");
    for (keyword, count) in &summary.top_keywords {
        info!("  {:<24} {}", keyword, count);
    }
    info!("Top subreddits with mentions:");
    for (subreddit, count) in &summary.top_subreddits {
        info!("  {:<24} {}", subreddit, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RecordKind;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, category: Category, content: &str) -> Record {
        Record {
            id: id.into(),
            category,
            subreddit: "testsub".into(),
            title: Some("a title".into()),
            content: Some(content.into()),
            author: "author".into(),
            score: 1,
            num_comments: None,
            created_utc: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            edited: false,
            kind: RecordKind::Post,
            parent_id: None,
        }
    }

    fn run_stage(rows: Vec<Record>) -> (CleanSummary, Vec<TaggedRecord>) {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path()).unwrap();
        records::save_csv(&paths.raw_csv, &rows).unwrap();
        let summary = run(&paths, &Taxonomy::default()).unwrap();
        let tagged: Vec<TaggedRecord> = records::load_csv(&paths.clean_csv).unwrap();
        (summary, tagged)
    }

    #[test]
    fn test_untagged_rows_dropped() {
        let (summary, tagged) = run_stage(vec![
            record("a", Category::Tech, "we run everything on aws now"),
            record("b", Category::Tech, "what a lovely sunset"),
        ]);
        assert_eq!(summary.input_rows, 2);
        assert_eq!(summary.kept_rows, 1);
        assert_eq!(tagged[0].id, "a");
        assert!(tagged[0].software_flag);
        assert_eq!(tagged[0].keywords(), vec!["aws".to_string()]);
    }

    #[test]
    fn test_duplicate_id_keeps_last() {
        let (_, tagged) = run_stage(vec![
            record("a", Category::Tech, "old text about docker"),
            record("a", Category::Tech, "new text about kubernetes"),
        ]);
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].keywords(), vec!["kubernetes".to_string()]);
    }

    #[test]
    fn test_duplicate_text_collapsed() {
        let (_, tagged) = run_stage(vec![
            record("a", Category::Tech, "docker is everywhere"),
            record("b", Category::Tech, "docker is everywhere"),
        ]);
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].id, "b");
    }

    #[test]
    fn test_cross_category_terms_ignored() {
        // Procore is a Construction term; in a Tech record it must not tag.
        let (_, tagged) = run_stage(vec![record(
            "a",
            Category::Tech,
            "procore keeps coming up at work",
        )]);
        assert!(tagged.is_empty());
    }

    #[test]
    fn test_clean_text_normalized() {
        let (_, tagged) = run_stage(vec![record(
            "a",
            Category::Construction,
            "Check https://procore.example ... Procore RULES!",
        )]);
        assert_eq!(tagged.len(), 1);
        assert!(!tagged[0].clean_text.contains("https"));
        assert!(tagged[0].clean_text.contains("procore rules"));
    }
}
