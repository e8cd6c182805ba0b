//! Collection stage: incremental scrape merged into the raw dataset.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use threadsift_core::{Category, DataPaths, Result};
use threadsift_pipeline::records::{self, Record};

use crate::reddit::RedditClient;

/// Collection tunables and the category → subreddit mapping.
#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// Posts fetched per subreddit.
    pub post_limit: usize,
    /// Comment cap per post.
    pub comment_limit: usize,
    /// Pause between subreddit fetches.
    pub pause: Duration,
    pub subreddits: Vec<(Category, Vec<String>)>,
}

impl Default for CollectConfig {
    fn default() -> Self {
        fn subs(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }

        Self {
            post_limit: 100,
            comment_limit: 15,
            pause: Duration::from_secs(8),
            subreddits: vec![
                (
                    Category::Law,
                    subs(&[
                        "legaltech",
                        "LawFirm",
                        "Law",
                        "LegalAdvice",
                        "LegalAdviceUK",
                        "LegalAdviceCanada",
                        "Paralegal",
                        "LawSchool",
                        "LegalNews",
                    ]),
                ),
                (
                    Category::Construction,
                    subs(&[
                        "Construction",
                        "Contractors",
                        "HomeImprovement",
                        "DIY",
                        "DIYChatRoom",
                        "Electrical",
                        "Plumbing",
                        "HVAC",
                        "AskEngineers",
                    ]),
                ),
                (
                    Category::Tech,
                    subs(&[
                        "sysadmin",
                        "msp",
                        "talesfromtechsupport",
                        "ITCareerQuestions",
                        "netsec",
                        "cybersecurity",
                        "technology",
                        "tech",
                        "gadgets",
                        "apple",
                        "linux",
                    ]),
                ),
            ],
        }
    }
}

/// What the collect stage did.
#[derive(Debug, Clone)]
pub struct CollectSummary {
    pub new_rows: usize,
    pub total_rows: usize,
}

/// Run the collection stage: fetch new posts and comments per subreddit,
/// skip anything not newer than the last scrape for that subreddit, and
/// merge into the raw CSV by id with the newest version winning.
pub async fn run(
    paths: &DataPaths,
    client: &RedditClient,
    config: &CollectConfig,
) -> Result<CollectSummary> {
    let existing: Vec<Record> = if paths.raw_csv.exists() {
        records::load_csv(&paths.raw_csv)?
    } else {
        Vec::new()
    };
    info!("Loaded {} existing rows", existing.len());

    let last_times = last_scrape_times(&existing);

    let mut fetched: Vec<Record> = Vec::new();
    for (category, subreddits) in &config.subreddits {
        for subreddit in subreddits {
            let last_time = last_times.get(subreddit.as_str()).copied();
            info!("Fetching r/{} (category: {})", subreddit, category);

            match fetch_subreddit(client, subreddit, *category, config, last_time).await {
                Ok(rows) => {
                    info!("  {} new rows from r/{}", rows.len(), subreddit);
                    fetched.extend(rows);
                }
                Err(e) => {
                    warn!("Skipping r/{}: {}", subreddit, e);
                }
            }

            tokio::time::sleep(config.pause).await;
        }
    }

    let new_rows = fetched.len();
    let merged = merge_by_id(existing, fetched);
    records::save_csv(&paths.raw_csv, &merged)?;

    let summary = CollectSummary {
        new_rows,
        total_rows: merged.len(),
    };
    info!(
        "Collection complete: {} new rows added, total = {}",
        summary.new_rows, summary.total_rows
    );
    Ok(summary)
}

async fn fetch_subreddit(
    client: &RedditClient,
    subreddit: &str,
    category: Category,
    config: &CollectConfig,
    last_time: Option<DateTime<Utc>>,
) -> Result<Vec<Record>> {
    let posts = client
        .fetch_new_posts(subreddit, category, config.post_limit)
        .await?;

    let mut rows = Vec::new();
    for post in posts {
        if let Some(last) = last_time {
            if post.created_utc <= last {
                continue;
            }
        }

        let post_id = post.id.clone();
        rows.push(post);

        match client
            .fetch_comments(subreddit, &post_id, category, config.comment_limit)
            .await
        {
            Ok(comments) => {
                rows.extend(comments.into_iter().filter(|c| {
                    last_time.map(|last| c.created_utc > last).unwrap_or(true)
                }));
            }
            Err(e) => warn!("Comments for {} unavailable: {}", post_id, e),
        }
    }
    Ok(rows)
}

/// Newest `created_utc` seen per subreddit.
fn last_scrape_times(rows: &[Record]) -> HashMap<&str, DateTime<Utc>> {
    let mut last: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for row in rows {
        last.entry(row.subreddit.as_str())
            .and_modify(|t| {
                if row.created_utc > *t {
                    *t = row.created_utc;
                }
            })
            .or_insert(row.created_utc);
    }
    last
}

/// Merge new rows into existing ones by id; the newer copy wins.
pub fn merge_by_id(existing: Vec<Record>, new: Vec<Record>) -> Vec<Record> {
    let mut merged: Vec<Record> = Vec::with_capacity(existing.len() + new.len());
    let mut slots: HashMap<String, usize> = HashMap::new();

    for record in existing.into_iter().chain(new) {
        match slots.get(&record.id) {
            Some(&slot) => merged[slot] = record,
            None => {
                slots.insert(record.id.clone(), merged.len());
                merged.push(record);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use threadsift_pipeline::records::RecordKind;

    fn record(id: &str, subreddit: &str, hour: u32, content: &str) -> Record {
        Record {
            id: id.into(),
            category: Category::Tech,
            subreddit: subreddit.into(),
            title: None,
            content: Some(content.into()),
            author: "a".into(),
            score: 0,
            num_comments: None,
            created_utc: Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
            edited: false,
            kind: RecordKind::Comment,
            parent_id: None,
        }
    }

    #[test]
    fn test_merge_keeps_latest_copy() {
        let existing = vec![record("x", "tech", 1, "old"), record("y", "tech", 2, "keep")];
        let new = vec![record("x", "tech", 3, "new")];

        let merged = merge_by_id(existing, new);
        assert_eq!(merged.len(), 2);
        let x = merged.iter().find(|r| r.id == "x").unwrap();
        assert_eq!(x.content.as_deref(), Some("new"));
    }

    #[test]
    fn test_last_scrape_times_per_subreddit() {
        let rows = vec![
            record("a", "tech", 1, ""),
            record("b", "tech", 5, ""),
            record("c", "linux", 3, ""),
        ];
        let last = last_scrape_times(&rows);
        assert_eq!(last["tech"], Utc.with_ymd_and_hms(2024, 6, 1, 5, 0, 0).unwrap());
        assert_eq!(last["linux"], Utc.with_ymd_and_hms(2024, 6, 1, 3, 0, 0).unwrap());
    }

    #[test]
    fn test_default_config_covers_all_categories() {
        let config = CollectConfig::default();
        assert_eq!(config.post_limit, 100);
        assert_eq!(config.comment_limit, 15);
        for cat in Category::all() {
            assert!(config.subreddits.iter().any(|(c, subs)| c == cat && !subs.is_empty()));
        }
    }
}
