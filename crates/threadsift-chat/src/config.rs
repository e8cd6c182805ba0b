//! LLM configuration and provider selection.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::LLMProvider;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Stored LLM configuration (read from llm-config.json, keys falling back to
/// environment variables).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    #[serde(default = "default_preferred")]
    pub preferred_provider: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub groq_api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
}

fn default_preferred() -> String {
    "auto".into()
}
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_anthropic_model() -> String {
    DEFAULT_ANTHROPIC_MODEL.into()
}
fn default_groq_model() -> String {
    DEFAULT_GROQ_MODEL.into()
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            preferred_provider: default_preferred(),
            openai_api_key: None,
            anthropic_api_key: None,
            groq_api_key: None,
            openai_model: default_openai_model(),
            anthropic_model: default_anthropic_model(),
            groq_model: default_groq_model(),
        }
    }
}

impl LLMConfig {
    /// Load config from file, falling back to env vars for missing keys.
    pub fn load(config_path: &Path) -> Self {
        let mut config: LLMConfig = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        if config.openai_api_key.is_none() {
            config.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if config.anthropic_api_key.is_none() {
            config.anthropic_api_key = std::env::var("ANTHROPIC_API_KEY").ok();
        }
        if config.groq_api_key.is_none() {
            config.groq_api_key = std::env::var("GROQ_API_KEY").ok();
        }

        config
    }

    /// Resolve which provider to use.
    ///
    /// Returns (provider, model, api_key) for the preferred provider if its
    /// key is set, or the first configured one when preference is "auto".
    pub fn resolve_provider(&self) -> Option<(LLMProvider, String, String)> {
        let openai = self
            .openai_api_key
            .as_ref()
            .map(|k| (LLMProvider::OpenAI, self.openai_model.clone(), k.clone()));
        let anthropic = self.anthropic_api_key.as_ref().map(|k| {
            (
                LLMProvider::Anthropic,
                self.anthropic_model.clone(),
                k.clone(),
            )
        });
        let groq = self
            .groq_api_key
            .as_ref()
            .map(|k| (LLMProvider::Groq, self.groq_model.clone(), k.clone()));

        match self.preferred_provider.as_str() {
            "openai" => openai,
            "anthropic" => anthropic,
            "groq" => groq,
            _ => openai.or(anthropic).or(groq),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_prefers_openai_first() {
        let config = LLMConfig {
            openai_api_key: Some("sk-a".into()),
            groq_api_key: Some("gsk-b".into()),
            ..Default::default()
        };
        let (provider, model, key) = config.resolve_provider().unwrap();
        assert_eq!(provider, LLMProvider::OpenAI);
        assert_eq!(model, DEFAULT_OPENAI_MODEL);
        assert_eq!(key, "sk-a");
    }

    #[test]
    fn test_explicit_preference_wins() {
        let config = LLMConfig {
            preferred_provider: "groq".into(),
            openai_api_key: Some("sk-a".into()),
            groq_api_key: Some("gsk-b".into()),
            ..Default::default()
        };
        let (provider, _, _) = config.resolve_provider().unwrap();
        assert_eq!(provider, LLMProvider::Groq);
    }

    #[test]
    fn test_no_keys_means_no_provider() {
        let config = LLMConfig::default();
        // Only meaningful when the environment carries no keys.
        if std::env::var("OPENAI_API_KEY").is_err()
            && std::env::var("ANTHROPIC_API_KEY").is_err()
            && std::env::var("GROQ_API_KEY").is_err()
        {
            assert!(config.resolve_provider().is_none());
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm-config.json");
        std::fs::write(
            &path,
            r#"{"preferred_provider":"anthropic","anthropic_api_key":"sk-ant"}"#,
        )
        .unwrap();

        let config = LLMConfig::load(&path);
        assert_eq!(config.preferred_provider, "anthropic");
        let (provider, model, _) = config.resolve_provider().unwrap();
        assert_eq!(provider, LLMProvider::Anthropic);
        assert_eq!(model, DEFAULT_ANTHROPIC_MODEL);
    }
}
