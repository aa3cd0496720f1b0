//! LLM provider abstraction.
//!
//! Every pipeline step is a stateless chat-completion call. The steps talk
//! to the provider through [`LlmProvider`] so tests can substitute a
//! scripted implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::error::PipelineError;

/// Sampling parameters for one chat call. Steps run with very low
/// temperatures for maximal determinism; callers must still treat responses
/// as non-repeatable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Token accounting reported by the provider, passed through on the wire
/// as `tokensUsed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// One completed chat call.
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub content: String,
    pub usage: TokenUsage,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(
        &self,
        system: &str,
        user: &str,
        options: ChatOptions,
    ) -> Result<ChatCompletion, PipelineError>;
}

/// Provider for OpenAI-compatible chat-completion endpoints.
pub struct OpenAiCompatibleProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, PipelineError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn chat(
        &self,
        system: &str,
        user: &str,
        options: ChatOptions,
    ) -> Result<ChatCompletion, PipelineError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        });

        let mut request = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.base_url.trim_end_matches('/')
            ))
            .json(&body);

        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(PipelineError::Upstream(format!(
                "OpenAI API error: {status} - {detail}"
            )));
        }

        let payload: ChatResponse = response.json().await?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::Upstream("réponse vide du fournisseur".to_string()))?;

        Ok(ChatCompletion {
            content,
            usage: payload.usage.unwrap_or_default(),
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChoicePayload>,
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct ChoicePayload {
    message: MessagePayload,
}

#[derive(Deserialize)]
struct MessagePayload {
    #[serde(default)]
    content: String,
}
