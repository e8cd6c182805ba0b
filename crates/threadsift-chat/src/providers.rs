//! Non-streaming completion calls against external LLM providers.
//!
//! OpenAI and Groq share the chat-completions format; Anthropic uses its
//! Messages API with the system prompt as a top-level field. Failures come
//! back as strings for the caller to surface; nothing is retried.

use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::types::{ChatMessage, LLMProvider};

/// Request a single completion from the given provider.
pub async fn complete(
    client: &Client,
    provider: LLMProvider,
    messages: &[ChatMessage],
    model: &str,
    api_key: &str,
    temperature: f64,
    max_tokens: usize,
) -> Result<String, String> {
    match provider {
        LLMProvider::OpenAI => {
            complete_openai_compat(
                client,
                "https://api.openai.com/v1/chat/completions",
                messages,
                model,
                api_key,
                temperature,
                max_tokens,
            )
            .await
        }
        LLMProvider::Groq => {
            complete_openai_compat(
                client,
                "https://api.groq.com/openai/v1/chat/completions",
                messages,
                model,
                api_key,
                temperature,
                max_tokens,
            )
            .await
        }
        LLMProvider::Anthropic => {
            complete_anthropic(client, messages, model, api_key, temperature, max_tokens).await
        }
    }
}

/// Completion against OpenAI-compatible APIs (OpenAI, Groq).
async fn complete_openai_compat(
    client: &Client,
    url: &str,
    messages: &[ChatMessage],
    model: &str,
    api_key: &str,
    temperature: f64,
    max_tokens: usize,
) -> Result<String, String> {
    let msgs: Vec<serde_json::Value> = messages
        .iter()
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    let body = json!({
        "model": model,
        "messages": msgs,
        "temperature": temperature,
        "max_tokens": max_tokens,
    });

    debug!("Requesting completion from {} with model {}", url, model);

    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("API error {}: {}", status, body));
    }

    let parsed: serde_json::Value = response
        .json()
        .await
        .map_err(|e| format!("Malformed response: {}", e))?;

    parsed["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| "Response contained no message content".to_string())
}

/// Completion against Anthropic's Messages API.
async fn complete_anthropic(
    client: &Client,
    messages: &[ChatMessage],
    model: &str,
    api_key: &str,
    temperature: f64,
    max_tokens: usize,
) -> Result<String, String> {
    // The system message is a top-level field, not part of the conversation.
    let system_msg: Option<String> = messages
        .iter()
        .find(|m| m.role == "system")
        .map(|m| m.content.clone());

    let conv_msgs: Vec<serde_json::Value> = messages
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    let mut body = json!({
        "model": model,
        "messages": conv_msgs,
        "temperature": temperature,
        "max_tokens": max_tokens,
    });
    if let Some(sys) = system_msg {
        body["system"] = json!(sys);
    }

    debug!("Requesting completion from Anthropic with model {}", model);

    let response = client
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", api_key)
        .header("anthropic-version", "2023-06-01")
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("API error {}: {}", status, body));
    }

    let parsed: serde_json::Value = response
        .json()
        .await
        .map_err(|e| format!("Malformed response: {}", e))?;

    parsed["content"][0]["text"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| "Response contained no text content".to_string())
}
