// Text-completion capability used as the resolver's probabilistic fallback

use crate::config::CompletionConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Failure of the completion capability; always absorbed by the resolver
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Completion service unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Completion service returned no text")]
    EmptyReply,
}

/// Narrow text-in, text-out capability injected into the resolver
#[async_trait::async_trait]
pub trait CompletionCapability: Send + Sync {
    /// Complete `input` under the given system `instructions`
    async fn complete(&self, instructions: &str, input: &str) -> Result<String, CompletionError>;
}

/// OpenAI-compatible chat completions client
pub struct HttpCompletion {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl HttpCompletion {
    /// Build the client described by `config`, or `None` when the fallback is disabled
    pub fn from_config(config: &CompletionConfig) -> anyhow::Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(
                "{} is not set, completion requests will be sent without credentials",
                config.api_key_env
            );
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("nexussync/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Some(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }))
    }
}

#[async_trait::async_trait]
impl CompletionCapability for HttpCompletion {
    async fn complete(&self, instructions: &str, input: &str) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: instructions,
                },
                ChatMessage {
                    role: "user",
                    content: input,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(CompletionError::EmptyReply)
    }
}
