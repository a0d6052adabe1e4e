use async_trait::async_trait;
use promptchain_core::{
    CompletionProvider, CompletionRequest, CompletionResponse, DEFAULT_BASE_URL, EventStream,
    Usage,
};
use reqwest::Client;
use tracing::{debug, info};

use crate::sse::event_stream;

/// Chat-completions client for OpenAI and API-compatible endpoints.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String) -> Self {
        info!("Creating OpenAiProvider");
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, request: &CompletionRequest) -> anyhow::Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({status}): {body}");
        }
        Ok(response)
    }

    /// Pull content and usage out of a non-streaming reply body.
    pub(crate) fn parse_completion(body: &serde_json::Value) -> anyhow::Result<CompletionResponse> {
        let choice = body["choices"]
            .get(0)
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing choices"))?;

        let content = choice["message"]["content"].as_str().map(str::to_string);

        let usage = body
            .get("usage")
            .filter(|u| u.is_object())
            .map(|u| {
                Usage::new(
                    token_count(&u["prompt_tokens"]),
                    token_count(&u["completion_tokens"]),
                )
            });

        Ok(CompletionResponse { content, usage })
    }
}

fn token_count(value: &serde_json::Value) -> u32 {
    u32::try_from(value.as_u64().unwrap_or(0)).unwrap_or(0)
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        info!(
            "Sending request to OpenAI API: model={}, messages={}",
            request.model,
            request.messages.len()
        );

        let body = self
            .post(request)
            .await?
            .json::<serde_json::Value>()
            .await?;

        let response = Self::parse_completion(&body)?;
        debug!("Received response from OpenAI API: usage={:?}", response.usage);
        Ok(response)
    }

    async fn stream(&self, request: &CompletionRequest) -> anyhow::Result<EventStream> {
        info!(
            "Opening stream to OpenAI API: model={}, messages={}",
            request.model,
            request.messages.len()
        );

        let response = self.post(request).await?;
        Ok(event_stream(response.bytes_stream()))
    }
}
