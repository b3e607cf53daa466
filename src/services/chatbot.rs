use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::session_manager::{Message, MessageRole};
use crate::config::Config;

const REFERER: &str = "https://portfolio-chatbot.com";
const TITLE: &str = "Portfolio Chatbot";

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("upstream timed out")]
    Timeout,

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("malformed completion: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CompletionError::Timeout
        } else if err.is_decode() {
            CompletionError::Malformed(err.to_string())
        } else {
            CompletionError::Transport(err.to_string())
        }
    }
}

/// Anything that can turn a prompt (system + history) into a reply.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<PromptMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct PromptMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// OpenRouter chat-completions client.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenRouterClient {
    pub fn new(config: &Config) -> Result<Self, CompletionError> {
        Self::with_timeout(config, config.request_timeout)
    }

    pub fn with_timeout(config: &Config, timeout: Duration) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: config.openrouter_url.clone(),
            api_key: config.openrouter_api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenRouterClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::MissingApiKey)?;

        let body = CompletionRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| PromptMessage { role: m.role.as_str(), content: &m.content })
                .collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, model = %self.model, "completion request rejected");
            return Err(CompletionError::Status(status.as_u16()));
        }

        let parsed: CompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| CompletionError::Malformed("no choices in completion".to_string()))
    }
}

/// Builds the prompt from the system text and the stored history, then asks
/// the backend for the next assistant turn.
pub async fn generate_reply(
    backend: &dyn CompletionBackend,
    system_prompt: &str,
    history: &[Message],
) -> Result<String, CompletionError> {
    let mut prompt = Vec::with_capacity(history.len() + 1);
    prompt.push(Message { role: MessageRole::System, content: system_prompt.to_string() });
    prompt.extend_from_slice(history);

    let reply = backend.complete(&prompt).await?;
    tracing::debug!(turns = history.len(), reply_len = reply.len(), "completion received");
    Ok(reply)
}
