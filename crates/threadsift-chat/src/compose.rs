//! Answer composition: retrieved passages + question → one summarized answer.

use reqwest::Client;
use tracing::debug;

use crate::providers;
use crate::types::{ChatMessage, ContextPassage, LLMProvider};

/// Canonical response when no relevant context exists or the model hedges.
pub const FALLBACK_ANSWER: &str = "I don't know based on the provided Reddit data.";

/// Substring in model output that signals a hedge to collapse.
const HEDGE_MARKER: &str = "I don't know";

/// How a composed answer terminated. Exactly one of these per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeOutcome {
    /// No surviving matches: fallback returned without a model call.
    NoContext,
    /// The model produced a usable answer.
    Answer,
    /// The model returned nothing or hedged; collapsed to the fallback.
    HedgeFallback,
}

/// A finished answer with its terminal outcome.
#[derive(Debug, Clone)]
pub struct ComposedAnswer {
    pub text: String,
    pub outcome: ComposeOutcome,
}

/// Composes answers from retrieved passages with a single summarization call.
pub struct AnswerComposer {
    pub temperature: f64,
    pub max_tokens: usize,
}

impl Default for AnswerComposer {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 400,
        }
    }
}

impl AnswerComposer {
    /// Compose an answer for `question` from `passages`.
    ///
    /// With zero passages the fixed fallback is returned without invoking the
    /// model, so `llm` may be `None` in that case. A provider failure is an
    /// `Err` for the caller to render; there are no retries.
    pub async fn compose(
        &self,
        client: &Client,
        llm: Option<(LLMProvider, &str, &str)>,
        question: &str,
        passages: &[ContextPassage],
    ) -> Result<ComposedAnswer, String> {
        if passages.is_empty() {
            debug!("No context passages; short-circuiting to fallback");
            return Ok(ComposedAnswer {
                text: FALLBACK_ANSWER.to_string(),
                outcome: ComposeOutcome::NoContext,
            });
        }

        let (provider, model, api_key) =
            llm.ok_or_else(|| "No LLM provider configured".to_string())?;

        let messages = build_messages(question, passages);
        let raw = providers::complete(
            client,
            provider,
            &messages,
            model,
            api_key,
            self.temperature,
            self.max_tokens,
        )
        .await?;

        Ok(finalize_answer(&raw))
    }
}

/// Build the system + user messages for the summarization call.
pub fn build_messages(question: &str, passages: &[ContextPassage]) -> Vec<ChatMessage> {
    let context: String = passages
        .iter()
        .map(|p| format!("[r/{}] {}", p.subreddit, p.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    let system_prompt = format!(
        "You are a research assistant summarizing Reddit discussions about software tools \
         used in Law, Construction, and Tech industries.\n\n\
         Use the Reddit excerpts below to answer accurately. You may make brief, logical \
         inferences from the context but avoid unsupported assumptions.\n\
         If the context does not include relevant data, respond with:\n\
         '{}'\n\n\
         Include subreddit or profession context if available.\n\n\
         Context:\n{}",
        FALLBACK_ANSWER, context
    );

    vec![
        ChatMessage {
            role: "system".into(),
            content: system_prompt,
        },
        ChatMessage {
            role: "user".into(),
            content: question.to_string(),
        },
    ]
}

/// Collapse empty or hedging model output into the canonical fallback.
pub fn finalize_answer(raw: &str) -> ComposedAnswer {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains(HEDGE_MARKER) {
        ComposedAnswer {
            text: FALLBACK_ANSWER.to_string(),
            outcome: ComposeOutcome::HedgeFallback,
        }
    } else {
        ComposedAnswer {
            text: trimmed.to_string(),
            outcome: ComposeOutcome::Answer,
        }
    }
}
