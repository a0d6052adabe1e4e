use promptchain_core::ChainError;
use tracing::debug;

/// Environment variable consulted when no explicit key is given.
pub const DEFAULT_ENVIRON_KEY: &str = "OPENAI_API_KEY";

/// Where the provider API key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeySource {
    Explicit(String),
    /// Name of an environment variable holding the key.
    Env(String),
}

impl Default for ApiKeySource {
    fn default() -> Self {
        Self::Env(DEFAULT_ENVIRON_KEY.to_string())
    }
}

impl ApiKeySource {
    /// An explicit key if one is given, otherwise the named variable.
    #[must_use]
    pub fn from_parts(api_key: Option<String>, environ_key: &str) -> Self {
        match api_key.filter(|key| !key.is_empty()) {
            Some(key) => Self::Explicit(key),
            None => Self::Env(environ_key.to_string()),
        }
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<String, ChainError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve with a caller-supplied variable lookup.
    ///
    /// An empty explicit key falls back to [`DEFAULT_ENVIRON_KEY`].
    pub fn resolve_with<F>(&self, lookup: F) -> Result<String, ChainError>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let name = match self {
            Self::Explicit(key) if !key.is_empty() => return Ok(key.clone()),
            Self::Explicit(_) => DEFAULT_ENVIRON_KEY,
            Self::Env(name) => name.as_str(),
        };
        debug!("Reading API key from ${name}");
        lookup(name)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ChainError::MissingCredential {
                env_var: name.to_string(),
            })
    }
}
