//! The conversation chain.
//!
//! `ConversationChain` accumulates an anchor and pending turns, submits them
//! with `pull`, and keeps the settled reply so later turns can build on it.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::BoxStream;
use futures::{StreamExt, future};
use promptchain_config::{ApiKeySource, Config};
use promptchain_core::{
    CallParameters, ChainError, ChatMessage, CompletionProvider, CompletionRequest,
    ResponseFormat, Role, StreamEvent, Usage, delta_text,
};
use promptchain_providers::OpenAiProvider;
use serde::Serialize;
use tracing::{debug, info};

use crate::json::{extract_json, schema_instruction};
use crate::prompt::{Prompt, Response};
use crate::retry::{RetryPolicy, retry_with_timeout};

const DEFAULT_JSON_MODEL: &str = "gpt-4-turbo";

/// Options for one [`ConversationChain::pull`].
#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    /// Example-shape object; when set the reply must be a JSON object.
    pub json_schema: Option<serde_json::Value>,
    /// Additional attempts after the first.
    pub retry_count: u32,
    /// Per-attempt budget.
    pub timeout: Option<Duration>,
    /// Pause before the first retry, doubled for each later one.
    pub backoff: Duration,
    pub params: CallParameters,
}

impl PullOptions {
    #[must_use]
    pub fn with_json_schema(mut self, schema: serde_json::Value) -> Self {
        self.json_schema = Some(schema);
        self
    }

    #[must_use]
    pub const fn with_retries(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: CallParameters) -> Self {
        self.params = params;
        self
    }

    /// Retry and timeout settings taken from the config file.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            retry_count: config.pull.retry_count,
            timeout: config.pull.timeout_ms.map(Duration::from_millis),
            ..Self::default()
        }
    }

    const fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retry_count,
            timeout: self.timeout,
            backoff: self.backoff,
        }
    }
}

/// Options for one [`ConversationChain::stream`].
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    /// Yield only text fragments instead of raw provider events.
    pub plain_text: bool,
    pub params: CallParameters,
}

impl StreamOptions {
    #[must_use]
    pub fn plain_text() -> Self {
        Self {
            plain_text: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: CallParameters) -> Self {
        self.params = params;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    Event(StreamEvent),
    Text(String),
}

impl StreamItem {
    /// Text carried by this item, whichever form it takes.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Event(event) => delta_text(event),
        }
    }
}

/// One conversation thread against a completion provider.
///
/// Mutating calls take `&mut self`; the chain is not meant to be shared
/// between tasks.
pub struct ConversationChain<P = Arc<dyn CompletionProvider>>
where
    P: Send + Sync,
{
    provider: P,
    model: String,
    json_model: String,
    anchor: Option<ChatMessage>,
    turns: Vec<ChatMessage>,
    last_response: Option<Response>,
    usage: Usage,
}

impl ConversationChain<OpenAiProvider> {
    /// Chain against the OpenAI endpoint, resolving the API key from `key`.
    pub fn connect(model: impl Into<String>, key: &ApiKeySource) -> Result<Self, ChainError> {
        let api_key = key.resolve()?;
        Ok(Self::new(OpenAiProvider::new(api_key), model))
    }

    /// Chain built from a loaded [`Config`].
    pub fn from_config(config: &Config) -> Result<Self, ChainError> {
        let api_key = config.provider.resolve_api_key()?;
        let provider =
            OpenAiProvider::new(api_key).with_base_url(config.provider.base_url.clone());
        Ok(Self::new(provider, config.model.clone()).with_json_model(config.json_model.clone()))
    }
}

impl<P> ConversationChain<P>
where
    P: CompletionProvider + Send + Sync,
{
    pub fn new(provider: P, model: impl Into<String>) -> Self {
        let model = model.into();
        info!("Creating conversation chain: model={model}");
        Self {
            provider,
            model,
            json_model: DEFAULT_JSON_MODEL.to_string(),
            anchor: None,
            turns: Vec::new(),
            last_response: None,
            usage: Usage::default(),
        }
    }

    /// Model used for JSON-mode pulls that do not name one themselves.
    #[must_use]
    pub fn with_json_model(mut self, model: impl Into<String>) -> Self {
        self.json_model = model.into();
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn json_model(&self) -> &str {
        &self.json_model
    }

    /// Set or replace the system message.
    pub fn anchor(&mut self, text: impl Into<String>) -> &mut Self {
        self.anchor = Some(ChatMessage::system(text));
        self
    }

    /// Append a user turn.
    pub fn link(&mut self, source: impl Into<Prompt>) -> Result<&mut Self, ChainError> {
        self.push_turn(source.into(), Role::User)
    }

    /// Append an assistant turn, e.g. to put words in the model's mouth.
    pub fn link_as_assistant(
        &mut self,
        source: impl Into<Prompt>,
    ) -> Result<&mut Self, ChainError> {
        self.push_turn(source.into(), Role::Assistant)
    }

    fn push_turn(&mut self, source: Prompt, role: Role) -> Result<&mut Self, ChainError> {
        let content = match source {
            Prompt::Literal(text) if text.is_empty() => return Err(ChainError::EmptyInput),
            Prompt::Literal(text) => text,
            Prompt::Derived(derive) => {
                let last = self
                    .last_response
                    .as_ref()
                    .ok_or(ChainError::NoPriorResponse)?;
                derive(last)
            }
        };

        self.turns.push(ChatMessage { role, content });
        Ok(self)
    }

    /// Rewrite the last response in place; does nothing if there is none.
    pub fn transform<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(Response) -> Response,
    {
        if let Some(last) = self.last_response.take() {
            self.last_response = Some(f(last));
        }
        self
    }

    /// Drop the anchor and pending turns, keeping the last response and usage.
    pub fn unhook(&mut self) -> &mut Self {
        self.anchor = None;
        self.turns.clear();
        self
    }

    #[must_use]
    pub const fn last(&self) -> Option<&Response> {
        self.last_response.as_ref()
    }

    #[must_use]
    pub const fn token_usage(&self) -> Usage {
        self.usage
    }

    #[must_use]
    pub const fn anchor_message(&self) -> Option<&ChatMessage> {
        self.anchor.as_ref()
    }

    #[must_use]
    pub fn turns(&self) -> &[ChatMessage] {
        &self.turns
    }

    /// The outgoing message list: anchor first, then pending turns in order.
    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.anchor
            .iter()
            .chain(self.turns.iter())
            .cloned()
            .collect()
    }

    fn build_request(&self, params: CallParameters, stream: bool) -> CompletionRequest {
        let model = params.model.clone().unwrap_or_else(|| self.model.clone());
        CompletionRequest {
            model,
            messages: self.messages(),
            stream,
            params,
        }
    }

    /// Submit the conversation and settle the reply into the chain.
    ///
    /// With a JSON schema the call is forced into JSON-object mode, pinned to
    /// the JSON model unless `params.model` names one, and an instruction turn
    /// describing the shape is appended to the pending turns. A failed pull
    /// removes that instruction turn again.
    ///
    /// On failure the previous last response is kept.
    pub async fn pull(&mut self, options: PullOptions) -> Result<&mut Self, ChainError> {
        let policy = options.policy();
        let mut params = options.params;
        let json_mode = options.json_schema.is_some();

        if let Some(schema) = &options.json_schema {
            let instruction = schema_instruction(schema)?;
            params.response_format = Some(ResponseFormat::json_object());
            if params.model.is_none() {
                params.model = Some(self.json_model.clone());
            }
            self.turns.push(ChatMessage::user(instruction));
        }

        let request = self.build_request(params, false);
        debug!(
            "Pulling: model={}, messages={}, json={json_mode}, attempts={}",
            request.model,
            request.messages.len(),
            policy.attempts()
        );

        let provider = &self.provider;
        let outcome =
            retry_with_timeout(|| Self::query(provider, &request, json_mode), &policy).await;
        let (response, usage) = match outcome {
            Ok(settled) => settled,
            Err(e) => {
                if json_mode {
                    self.turns.pop();
                }
                return Err(e);
            }
        };

        if let Some(usage) = usage {
            self.usage.accumulate(usage);
        }
        info!(
            "Pull settled: model={}, total_tokens={}",
            request.model,
            self.usage.total_tokens()
        );
        self.last_response = Some(response);
        Ok(self)
    }

    async fn query(
        provider: &P,
        request: &CompletionRequest,
        json_mode: bool,
    ) -> Result<(Response, Option<Usage>), ChainError> {
        let completion = provider.complete(request).await?;
        let content = completion
            .content
            .filter(|content| !content.is_empty())
            .ok_or(ChainError::EmptyCompletion)?;

        let response = if json_mode {
            Response::Json(extract_json(&content)?)
        } else {
            Response::Text(content)
        };
        Ok((response, completion.usage))
    }

    /// Submit the conversation as a streaming request.
    ///
    /// The stream is consumed directly by the caller: it is never retried and
    /// does not touch the last response or usage.
    pub async fn stream(
        &self,
        options: StreamOptions,
    ) -> Result<BoxStream<'static, Result<StreamItem, ChainError>>, ChainError> {
        let request = self.build_request(options.params, true);
        debug!(
            "Streaming: model={}, messages={}",
            request.model,
            request.messages.len()
        );

        let events = self.provider.stream(&request).await?;

        if options.plain_text {
            Ok(events
                .filter_map(|event| {
                    future::ready(match event {
                        Ok(event) => delta_text(&event)
                            .filter(|text| !text.is_empty())
                            .map(|text| Ok(StreamItem::Text(text.to_string()))),
                        Err(e) => Some(Err(ChainError::Provider(e))),
                    })
                })
                .boxed())
        } else {
            Ok(events
                .map(|event| event.map(StreamItem::Event).map_err(ChainError::Provider))
                .boxed())
        }
    }

    /// Dump the anchor, pending turns and last response.
    pub fn log(&self) -> &Self {
        let rule = "=".repeat(60);
        info!("{rule}");
        info!("System: {}", to_json(&self.anchor));
        info!("User: {}", to_json(&self.turns));
        info!("Text: {}", to_json(&self.last_response));
        info!("{rule}");
        self
    }

    /// Dump cumulative token usage.
    pub fn log_tokens(&self) -> &Self {
        let rule = "=".repeat(60);
        info!("{rule}");
        info!("Prompt tokens: {}", self.usage.prompt_tokens);
        info!("Completion tokens: {}", self.usage.completion_tokens);
        info!("Total tokens: {}", self.usage.total_tokens());
        info!("{rule}");
        self
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}
