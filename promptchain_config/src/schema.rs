use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use promptchain_core::{ChainError, DEFAULT_BASE_URL};

use crate::credentials::{ApiKeySource, DEFAULT_ENVIRON_KEY};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "Config::default_model")]
    pub model: String,
    /// Model pinned for strict-JSON replies when the caller names none.
    #[serde(default = "Config::default_json_model")]
    pub json_model: String,
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub pull: PullDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: Self::default_model(),
            json_model: Self::default_json_model(),
            provider: ProviderSettings::default(),
            pull: PullDefaults::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "ProviderSettings::default_environ_key")]
    pub environ_key: String,
    #[serde(default = "ProviderSettings::default_base_url")]
    pub base_url: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            environ_key: Self::default_environ_key(),
            base_url: Self::default_base_url(),
        }
    }
}

impl ProviderSettings {
    fn default_environ_key() -> String {
        DEFAULT_ENVIRON_KEY.to_string()
    }

    fn default_base_url() -> String {
        DEFAULT_BASE_URL.to_string()
    }

    #[must_use]
    pub fn key_source(&self) -> ApiKeySource {
        ApiKeySource::from_parts(self.api_key.clone(), &self.environ_key)
    }

    pub fn resolve_api_key(&self) -> Result<String, ChainError> {
        self.key_source().resolve()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullDefaults {
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Config {
    fn default_model() -> String {
        "gpt-3.5-turbo".to_string()
    }

    fn default_json_model() -> String {
        "gpt-4-turbo".to_string()
    }

    fn config_path() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("promptchain")
            .join("config.json"))
    }

    /// Load `~/promptchain/config.json`, or defaults when it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        Self::from_file(&config_path)
    }

    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config at {}: {e}", path.display()))?;
        Ok(config)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("promptchain");

        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    /// Write a config template, refusing to overwrite an existing one.
    pub fn create_config() -> anyhow::Result<PathBuf> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        let template = serde_json::to_string_pretty(&Self::default())?;
        std::fs::write(&config_path, template)?;

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap_or_default();
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.provider.environ_key, "OPENAI_API_KEY");
        assert_eq!(config.json_model, "gpt-4-turbo");
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let raw = r#"{
            "model": "gpt-4o-mini",
            "provider": { "environ_key": "AZURE_KEY" },
            "pull": { "retry_count": 2, "timeout_ms": 30000 }
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap_or_default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.json_model, "gpt-4-turbo");
        assert_eq!(config.provider.environ_key, "AZURE_KEY");
        assert_eq!(config.provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(
            config.pull,
            PullDefaults {
                retry_count: 2,
                timeout_ms: Some(30000)
            }
        );
    }

    #[test]
    fn explicit_key_wins_over_environment() {
        let settings = ProviderSettings {
            api_key: Some("sk-file".to_string()),
            ..ProviderSettings::default()
        };
        assert_eq!(
            settings.key_source(),
            ApiKeySource::Explicit("sk-file".to_string())
        );
    }

    #[test]
    fn template_round_trips_through_from_file() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join(format!(
            "promptchain-config-test-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, serde_json::to_string_pretty(&Config::default())?)?;

        let loaded = Config::from_file(&path);
        std::fs::remove_file(&path)?;
        assert_eq!(loaded?, Config::default());
        Ok(())
    }

    #[test]
    fn invalid_file_reports_its_path() {
        let path = std::env::temp_dir().join(format!(
            "promptchain-config-bad-{}.json",
            std::process::id()
        ));
        let _ = std::fs::write(&path, "{ not json");
        let err = Config::from_file(&path).err().map(|e| e.to_string());
        let _ = std::fs::remove_file(&path);
        assert!(err.is_some_and(|msg| msg.contains("promptchain-config-bad")));
    }
}
