use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChainError>;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error(
        "API key not found. Pass an explicit key or set the {env_var} environment variable."
    )]
    MissingCredential { env_var: String },

    #[error("Prompt text cannot be empty")]
    EmptyInput,

    #[error("No model response to link to")]
    NoPriorResponse,

    #[error("json_schema must be a JSON object, got {0}")]
    InvalidSchema(String),

    #[error("Completion call timed out after {0:?}")]
    Timeout(Duration),

    #[error(
        "Response was not in the expected JSON format ({0}). Check that max_tokens is not so low that the response is truncated."
    )]
    MalformedJson(String),

    #[error("No completion message found")]
    EmptyCompletion,

    #[error("Completion provider error: {0}")]
    Provider(#[from] anyhow::Error),
}

impl ChainError {
    /// Transient failures of the remote call or its parse step.
    ///
    /// Misuse errors are deterministic and never retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Provider(_) | Self::Timeout(_) | Self::MalformedJson(_) | Self::EmptyCompletion
        )
    }
}
