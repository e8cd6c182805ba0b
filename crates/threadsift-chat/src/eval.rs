//! Pluggable answer-relevance scoring for the evaluation stage.

use reqwest::Client;

use crate::providers;
use crate::types::{ChatMessage, LLMProvider};

/// Scores how relevant an answer is to its question, on a 0 to 5 scale.
///
/// Kept separate from the composer so evaluation strategies can be swapped
/// without touching the answer path.
pub trait RelevanceScorer {
    fn score(
        &self,
        question: &str,
        answer: &str,
    ) -> impl std::future::Future<Output = Result<f64, String>> + Send;
}

/// Relevance scoring with one model call that returns a bare number.
pub struct LlmRelevanceScorer {
    pub client: Client,
    pub provider: LLMProvider,
    pub model: String,
    pub api_key: String,
}

impl RelevanceScorer for LlmRelevanceScorer {
    async fn score(&self, question: &str, answer: &str) -> Result<f64, String> {
        let messages = vec![
            ChatMessage {
                role: "system".into(),
                content: "You grade answer relevance. Given a question and an answer, \
                          reply with a single number from 0 (irrelevant) to 5 (fully \
                          answers the question). Reply with the number only."
                    .into(),
            },
            ChatMessage {
                role: "user".into(),
                content: format!("Question: {}\n\nAnswer: {}", question, answer),
            },
        ];

        let raw = providers::complete(
            &self.client,
            self.provider,
            &messages,
            &self.model,
            &self.api_key,
            0.0,
            8,
        )
        .await?;

        parse_score(&raw)
    }
}

/// Extract the leading number from a grading reply and clamp it to [0, 5].
pub fn parse_score(raw: &str) -> Result<f64, String> {
    let token = raw
        .trim()
        .split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .find(|t| !t.is_empty())
        .ok_or_else(|| format!("No score in reply: {:?}", raw))?;

    token
        .parse::<f64>()
        .map(|s| s.clamp(0.0, 5.0))
        .map_err(|e| format!("Bad score {:?}: {}", token, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_number() {
        assert_eq!(parse_score("4").unwrap(), 4.0);
        assert_eq!(parse_score(" 3.5 \n").unwrap(), 3.5);
    }

    #[test]
    fn test_parse_number_with_prose() {
        assert_eq!(parse_score("Score: 2").unwrap(), 2.0);
    }

    #[test]
    fn test_parse_clamps_range() {
        assert_eq!(parse_score("9").unwrap(), 5.0);
    }

    #[test]
    fn test_parse_rejects_no_number() {
        assert!(parse_score("no idea").is_err());
    }
}
