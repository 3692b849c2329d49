//! Chat completion client for answer generation and question rewriting.
//!
//! [`OpenAiChatClient`] speaks the OpenAI-compatible `/v1/chat/completions`
//! protocol and works against Groq (the default base URL) or any other
//! compatible backend. Transient failures (429, 5xx, network) retry with the
//! same exponential backoff contract as the embedding providers.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::models::ChatMessage;

/// Trait for chat-completion backends. The pipelines depend on this seam so
/// tests can substitute a scripted model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;
    /// Run a completion over the given messages and return the assistant text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Client for an OpenAI-compatible chat completions API.
pub struct OpenAiChatClient {
    model: String,
    base_url: String,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    max_retries: u32,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiChatClient {
    /// Create a client from configuration. The API key is read from the
    /// environment variable named by `llm.api_key_env`.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", config.api_key_env))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // 1s, 2s, 4s, ... capped at 2^5
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&request)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let completion: CompletionResponse = response.json().await?;
                        return extract_content(completion);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err =
                            Some(anyhow::anyhow!("Chat API error {}: {}", status, body_text));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Chat API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(anyhow::anyhow!("Chat API connection error: {}", e));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Chat completion failed after retries")))
    }
}

fn extract_content(completion: CompletionResponse) -> Result<String> {
    completion
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| anyhow::anyhow!("Chat API response contained no choices"))
}

// ============ Wire types ============

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatMessage;

    #[test]
    fn request_serializes_roles_and_skips_unset_options() {
        let messages = vec![
            ChatMessage::system("Be concise."),
            ChatMessage::user("What is chunking?"),
        ];
        let request = CompletionRequest {
            model: "llama-3.1-8b-instant",
            messages: &messages,
            temperature: None,
            max_tokens: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""role":"system""#));
        assert!(json.contains(r#""role":"user""#));
        assert!(!json.contains("temperature"));
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn response_parses_first_choice_content() {
        let json = r#"{
            "model": "llama-3.1-8b-instant",
            "choices": [
                { "message": { "role": "assistant", "content": "The answer." }, "finish_reason": "stop" }
            ],
            "usage": { "prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13 }
        }"#;
        let completion: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_content(completion).unwrap(), "The answer.");
    }

    #[test]
    fn empty_choices_is_an_error() {
        let completion = CompletionResponse { choices: vec![] };
        assert!(extract_content(completion).is_err());
    }
}
