#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

pub mod error;
pub mod params;

pub use error::ChainError;

/// Chat-completions endpoint used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub use params::{CallParameters, ResponseFormat, ResponseFormatType, Stop};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Token counts reported by a provider for one call, or accumulated across calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    #[must_use]
    pub const fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    #[must_use]
    pub const fn total_tokens(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }

    /// Add another call's counts into this running total.
    pub const fn accumulate(&mut self, other: Self) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self
            .completion_tokens
            .saturating_add(other.completion_tokens);
    }
}

/// Wire request for a chat completion.
///
/// Sampling parameters are flattened into the top-level object; unset ones
/// are omitted entirely.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(flatten)]
    pub params: CallParameters,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    /// First choice's message content; `None` when the provider sent none.
    pub content: Option<String>,
    pub usage: Option<Usage>,
}

/// One raw incremental event from a streaming completion.
pub type StreamEvent = serde_json::Value;

pub type EventStream = BoxStream<'static, anyhow::Result<StreamEvent>>;

/// The remote completion endpoint.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse>;

    /// Open a streaming completion. The returned stream is finite and cannot
    /// be restarted.
    async fn stream(&self, request: &CompletionRequest) -> anyhow::Result<EventStream>;
}

#[async_trait]
impl<P: CompletionProvider + ?Sized> CompletionProvider for std::sync::Arc<P> {
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        (**self).complete(request).await
    }

    async fn stream(&self, request: &CompletionRequest) -> anyhow::Result<EventStream> {
        (**self).stream(request).await
    }
}

/// Text fragment carried by a streaming event (`choices[0].delta.content`).
#[must_use]
pub fn delta_text(event: &StreamEvent) -> Option<&str> {
    event["choices"][0]["delta"]["content"].as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_serializes_lowercase() {
        let msg = ChatMessage::assistant("hi");
        let value = serde_json::to_value(&msg).unwrap_or_default();
        assert_eq!(value, json!({"role": "assistant", "content": "hi"}));
    }

    #[test]
    fn usage_accumulates() {
        let mut total = Usage::default();
        total.accumulate(Usage::new(10, 5));
        total.accumulate(Usage::new(7, 3));
        assert_eq!(total, Usage::new(17, 8));
        assert_eq!(total.total_tokens(), 25);
    }

    #[test]
    fn request_omits_unset_parameters() {
        let request = CompletionRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![ChatMessage::user("hello")],
            stream: false,
            params: CallParameters {
                max_tokens: Some(64),
                ..CallParameters::default()
            },
        };
        let value = serde_json::to_value(&request).unwrap_or_default();
        assert_eq!(
            value,
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "hello"}],
                "stream": false,
                "max_tokens": 64
            })
        );
    }

    #[test]
    fn delta_text_reads_first_choice() {
        let event = json!({"choices": [{"delta": {"content": "Par"}}]});
        assert_eq!(delta_text(&event), Some("Par"));
        assert_eq!(delta_text(&json!({"choices": [{"delta": {}}]})), None);
    }
}
