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

//! Remote completion providers.

mod openai;
mod sse;

pub use openai::OpenAiProvider;
pub use promptchain_core::DEFAULT_BASE_URL;
pub use sse::{SseDecoder, SseLine, event_stream};
