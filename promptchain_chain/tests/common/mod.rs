//! Scripted completion provider shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::StreamExt;
use promptchain_chain::ConversationChain;
use promptchain_core::{
    CompletionProvider, CompletionRequest, CompletionResponse, EventStream, StreamEvent, Usage,
};
use serde_json::json;

/// What the provider does for one incoming request.
pub enum Step {
    Reply {
        content: Option<String>,
        usage: Option<Usage>,
    },
    Fail(String),
    /// Never resolves.
    Hang,
    Stream(Vec<anyhow::Result<StreamEvent>>),
}

impl Step {
    pub fn text(content: &str) -> Self {
        Self::Reply {
            content: Some(content.to_string()),
            usage: None,
        }
    }

    pub fn text_with_usage(content: &str, prompt: u32, completion: u32) -> Self {
        Self::Reply {
            content: Some(content.to_string()),
            usage: Some(Usage::new(prompt, completion)),
        }
    }

    pub fn deltas(fragments: &[&str]) -> Self {
        let mut events: Vec<anyhow::Result<StreamEvent>> = fragments
            .iter()
            .map(|fragment| Ok(json!({"choices": [{"delta": {"content": fragment}}]})))
            .collect();
        events.push(Ok(json!({"choices": [{"delta": {}, "finish_reason": "stop"}]})));
        Self::Stream(events)
    }
}

#[derive(Default)]
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_step(&self, request: &CompletionRequest) -> Option<Step> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        match self.next_step(request) {
            Some(Step::Reply { content, usage }) => Ok(CompletionResponse { content, usage }),
            Some(Step::Fail(message)) => Err(anyhow::anyhow!(message)),
            Some(Step::Hang) => futures::future::pending().await,
            Some(Step::Stream(_)) => anyhow::bail!("stream step used for complete()"),
            None => anyhow::bail!("script exhausted"),
        }
    }

    async fn stream(&self, request: &CompletionRequest) -> anyhow::Result<EventStream> {
        match self.next_step(request) {
            Some(Step::Stream(events)) => Ok(futures::stream::iter(events).boxed()),
            Some(Step::Fail(message)) => Err(anyhow::anyhow!(message)),
            _ => anyhow::bail!("expected a stream step"),
        }
    }
}

pub fn chain(steps: Vec<Step>) -> (ConversationChain<Arc<ScriptedProvider>>, Arc<ScriptedProvider>) {
    let provider = ScriptedProvider::new(steps);
    (
        ConversationChain::new(provider.clone(), "gpt-3.5-turbo"),
        provider,
    )
}
