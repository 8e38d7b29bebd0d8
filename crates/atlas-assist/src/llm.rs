//! Chat-completion boundary.
//!
//! [`OpenAiChat`] talks to any OpenAI-compatible `/chat/completions`
//! endpoint over plain REST.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

use atlas_core::config::LlmSettings;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("language model not configured: {0}")]
    NotConfigured(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("language model returned status {status}")]
    Status { status: u16, detail: Value },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// JSON detail suitable for an error response body.
    pub fn detail(&self) -> Value {
        match self {
            LlmError::Status { detail, .. } => detail.clone(),
            other => Value::String(other.to_string()),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Free-form text completion given a system instruction and a user message.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

pub struct OpenAiChat {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiChat {
    pub fn new(settings: &LlmSettings) -> Result<Self, LlmError> {
        if !settings.has_api_key() {
            return Err(LlmError::NotConfigured("OPENAI_API_KEY is not set".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            api_key: settings.api_key.trim().to_string(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!({ "text": text }));
            tracing::error!(status = status.as_u16(), %detail, "chat completion failed");
            return Err(LlmError::Status { status: status.as_u16(), detail });
        }

        let data: Value = serde_json::from_str(&text)
            .map_err(|e| LlmError::InvalidResponse(format!("body is not JSON: {e}")))?;
        Ok(completion_text(&data))
    }
}

/// `choices[0].message.content`, trimmed; empty when absent.
pub fn completion_text(data: &Value) -> String {
    data.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string()
}
