use async_trait::async_trait;
use thiserror::Error;

use crate::message::{ChatRequest, ChatResponse};

pub const DEFAULT_ERROR: &str = "Sorry, I encountered an error. Please try again.";
pub const NETWORK_ERROR: &str = "Network error. Please check your connection and try again.";

/// Normalized outcome of one chat round trip. Both variants are shown to the
/// user as a bot message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered {0}")]
    Status(reqwest::StatusCode),
}

/// The two calls the widget makes against the backend.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// One attempt, never fails: every outcome is folded into an `ApiResponse`.
    async fn send_message(&self, text: &str) -> ApiResponse;

    async fn clear_chat(&self) -> Result<(), ClientError>;
}

/// `ChatApi` over HTTP. Keeps a cookie store so the backend recognizes the
/// same visitor across calls.
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self { client, base_url: base_url.trim_end_matches('/').to_string() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_message(&self, text: &str) -> Result<(reqwest::StatusCode, ChatResponse), ClientError> {
        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&ChatRequest { message: text.to_string() })
            .send()
            .await?;
        let status = response.status();
        // The body is decoded before the status is looked at; an unreadable
        // body counts as a transport failure whatever the status.
        let body: ChatResponse = response.json().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn send_message(&self, text: &str) -> ApiResponse {
        match self.post_message(text).await {
            Ok((status, body)) if status.is_success() && body.is_success() => match body.response {
                Some(reply) => ApiResponse::ok(reply),
                None => ApiResponse::failed(DEFAULT_ERROR),
            },
            Ok((status, body)) => {
                tracing::debug!(%status, "chat request reported an error");
                ApiResponse::failed(body.error.unwrap_or_else(|| DEFAULT_ERROR.to_string()))
            }
            Err(err) => {
                tracing::warn!(error = %err, "chat request failed");
                ApiResponse::failed(NETWORK_ERROR)
            }
        }
    }

    async fn clear_chat(&self) -> Result<(), ClientError> {
        let response = self.client.post(self.url("/api/clear")).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::Status(status))
        }
    }
}
