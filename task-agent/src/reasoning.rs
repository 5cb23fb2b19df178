//! Reasoning service abstraction and OpenAI-backed implementation.
//!
//! The workflow only sees the [`ReasoningService`] trait; tests script it,
//! production wires in [`OpenAiReasoning`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ReasoningError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// A single completion request: one system prompt, one user message.
#[derive(Debug, Clone)]
pub struct ReasoningRequest {
    pub system: String,
    pub user: String,
}

/// A text-in, text-out reasoning backend.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn complete(&self, request: &ReasoningRequest) -> Result<String, ReasoningError>;
}

/// Reasoning service backed by an OpenAI-compatible chat completions API.
pub struct OpenAiReasoning {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiReasoning {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl ReasoningService for OpenAiReasoning {
    async fn complete(&self, request: &ReasoningRequest) -> Result<String, ReasoningError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReasoningError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or(ReasoningError::Empty)
    }
}

/// Strip a markdown code fence around a JSON payload, if present.
///
/// Models wrap structured output in ```json fences often enough that every
/// parse site goes through this first.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(inner) = trimmed.strip_prefix("```json") {
        if let Some(body) = inner.split("```").next() {
            return body.trim();
        }
    }
    if let Some(inner) = trimmed.strip_prefix("```") {
        if let Some(body) = inner.split("```").next() {
            return body.trim();
        }
    }
    trimmed
}

/// Parse a reasoning response as JSON after fence stripping.
pub fn parse_response<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(extract_json(text))
}
