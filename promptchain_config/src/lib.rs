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

//! Credentials and on-disk settings.

mod credentials;
mod schema;

pub use credentials::{ApiKeySource, DEFAULT_ENVIRON_KEY};
pub use schema::{Config, ProviderSettings, PullDefaults};
