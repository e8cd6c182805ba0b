//! ThreadSift Chat — LLM completion providers, answer composition, and the
//! pluggable relevance scorer used by the evaluation stage.

pub mod compose;
pub mod config;
pub mod eval;
pub mod providers;
pub mod types;

pub use compose::{AnswerComposer, ComposeOutcome, ComposedAnswer, FALLBACK_ANSWER};
pub use config::LLMConfig;
pub use eval::{LlmRelevanceScorer, RelevanceScorer};
pub use types::{ChatMessage, ChatRequest, ContextPassage, LLMProvider};
