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

//! Fluent prompt chaining over a chat-completion endpoint.
//!
//! A [`ConversationChain`] owns one conversation thread: an optional system
//! anchor, the pending turns, the last settled response and cumulative token
//! usage. Each `pull` submits the anchor plus pending turns and stores the
//! reply so the next turn can be derived from it.
//!
//! ```no_run
//! use promptchain_chain::{ConversationChain, Prompt, PullOptions};
//! use promptchain_config::ApiKeySource;
//!
//! # async fn run() -> Result<(), promptchain_core::ChainError> {
//! let mut chain = ConversationChain::connect("gpt-3.5-turbo", &ApiKeySource::default())?;
//! chain
//!     .anchor("You are a historian.")
//!     .link("What is the capital of France?")?
//!     .pull(PullOptions::default())
//!     .await?;
//! chain
//!     .unhook()
//!     .link(Prompt::reply(|answer| format!("Extract the city in: {answer}")))?
//!     .pull(PullOptions::default().with_json_schema(serde_json::json!({"city": "string"})))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! A chain is not synchronized; callers drive it from one task at a time.

mod chain;
mod json;
mod prompt;
mod retry;

pub use chain::{ConversationChain, PullOptions, StreamItem, StreamOptions};
pub use json::{extract_json, schema_instruction};
pub use prompt::{Prompt, Response};
pub use retry::{RetryPolicy, retry_with_timeout};
