//! Thin client for Reddit's public JSON listing endpoints.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use threadsift_core::{Category, Error, Result};
use threadsift_pipeline::records::{Record, RecordKind};

const USER_AGENT: &str = "threadsift:0.1 (industry software mentions)";

/// Client for the unauthenticated `*.json` listing endpoints.
pub struct RedditClient {
    client: Client,
    base_url: String,
}

impl RedditClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, "https://www.reddit.com")
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch the newest posts of a subreddit.
    pub async fn fetch_new_posts(
        &self,
        subreddit: &str,
        category: Category,
        limit: usize,
    ) -> Result<Vec<Record>> {
        let url = format!(
            "{}/r/{}/new.json?limit={}&raw_json=1",
            self.base_url, subreddit, limit
        );
        let listing = self.get_json(&url).await?;
        Ok(parse_posts(&listing, category, subreddit))
    }

    /// Fetch the comments of one post, capped at `limit` rows.
    pub async fn fetch_comments(
        &self,
        subreddit: &str,
        post_id: &str,
        category: Category,
        limit: usize,
    ) -> Result<Vec<Record>> {
        let url = format!(
            "{}/r/{}/comments/{}.json?raw_json=1",
            self.base_url, subreddit, post_id
        );
        let response = self.get_json(&url).await?;

        // The comments endpoint returns [post listing, comment listing].
        let comment_listing = response
            .get(1)
            .ok_or_else(|| Error::Collect("comment listing missing".into()))?;
        Ok(parse_comments(comment_listing, category, subreddit, limit))
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Http(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| Error::Http(format!("malformed listing: {}", e)))
    }
}

/// Parse a `/new.json` listing into post records.
pub fn parse_posts(listing: &Value, category: Category, subreddit: &str) -> Vec<Record> {
    let Some(children) = listing["data"]["children"].as_array() else {
        warn!("Listing for r/{} had no children array", subreddit);
        return Vec::new();
    };

    children
        .iter()
        .filter_map(|child| {
            let data = &child["data"];
            let id = data["id"].as_str()?;
            Some(Record {
                id: id.to_string(),
                category,
                subreddit: subreddit.to_string(),
                title: data["title"].as_str().map(String::from),
                content: data["selftext"].as_str().map(String::from),
                author: data["author"].as_str().unwrap_or("[deleted]").to_string(),
                score: data["score"].as_i64().unwrap_or(0),
                num_comments: data["num_comments"].as_i64(),
                created_utc: epoch_to_datetime(&data["created_utc"])?,
                edited: is_edited(&data["edited"]),
                kind: RecordKind::Post,
                parent_id: None,
            })
        })
        .collect()
}

/// Parse a comment listing into comment records, capped at `limit`.
pub fn parse_comments(
    listing: &Value,
    category: Category,
    subreddit: &str,
    limit: usize,
) -> Vec<Record> {
    let Some(children) = listing["data"]["children"].as_array() else {
        return Vec::new();
    };

    children
        .iter()
        .filter(|child| child["kind"].as_str() == Some("t1"))
        .filter_map(|child| {
            let data = &child["data"];
            let id = data["id"].as_str()?;
            Some(Record {
                id: id.to_string(),
                category,
                subreddit: subreddit.to_string(),
                title: None,
                content: data["body"].as_str().map(String::from),
                author: data["author"].as_str().unwrap_or("[deleted]").to_string(),
                score: data["score"].as_i64().unwrap_or(0),
                num_comments: None,
                created_utc: epoch_to_datetime(&data["created_utc"])?,
                edited: is_edited(&data["edited"]),
                kind: RecordKind::Comment,
                parent_id: data["parent_id"].as_str().map(String::from),
            })
        })
        .take(limit)
        .collect()
}

/// `created_utc` arrives as a float epoch.
fn epoch_to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    let secs = value.as_f64()?;
    Utc.timestamp_opt(secs as i64, 0).single()
}

/// `edited` is `false` for untouched items and an epoch float otherwise.
fn is_edited(value: &Value) -> bool {
    !matches!(value, Value::Bool(false) | Value::Null)
}
