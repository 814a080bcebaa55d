//! TOML-based application configuration.
//!
//! Stores the task-store endpoint, ranking-service credentials, and the
//! optional project-context file path. Read from
//! `~/.config/focusdeck/config.toml`; individual values can be
//! overridden through `FOCUSDECK_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Task-store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,
    /// Bearer token for the store API. Empty means unconfigured.
    #[serde(default)]
    pub token: String,
}

/// Ranking-service settings. Leaving `api_key` unset selects the
/// deterministic heuristic backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_ranking_model")]
    pub model: String,
    #[serde(default = "default_ranking_timeout")]
    pub timeout_secs: u64,
}

/// Project-context sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Path to the `{"projects": [...]}` JSON file, if any.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focusdeck/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub contexts: ContextConfig,
}

// Default functions
fn default_store_url() -> String {
    "http://localhost:3456".into()
}
fn default_ranking_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_ranking_timeout() -> u64 {
    20
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            token: String::new(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_ranking_model(),
            timeout_secs: default_ranking_timeout(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            ranking: RankingConfig::default(),
            contexts: ContextConfig::default(),
        }
    }
}

impl Settings {
    /// Location of the config file, if a config directory exists.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("focusdeck").join("config.toml"))
    }

    /// Load settings from the default location, then apply environment
    /// overrides. A missing file yields defaults; a malformed file is an
    /// error.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Load settings from an explicit TOML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("FOCUSDECK_STORE_URL") {
            self.store.url = url;
        }
        if let Ok(token) = std::env::var("FOCUSDECK_STORE_TOKEN") {
            self.store.token = token;
        }
        if let Ok(key) = std::env::var("FOCUSDECK_RANKING_API_KEY") {
            self.ranking.api_key = Some(key);
        }
        if let Ok(path) = std::env::var("FOCUSDECK_CONTEXTS") {
            self.contexts.path = Some(PathBuf::from(path));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert!(settings.store.token.is_empty());
        assert!(settings.ranking.api_key.is_none());
        assert_eq!(settings.ranking.timeout_secs, 20);
        assert!(settings.contexts.path.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[store]\nurl = \"https://tasks.example.com\"\ntoken = \"tk\"\n"
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.store.url, "https://tasks.example.com");
        assert_eq!(settings.store.token, "tk");
        assert_eq!(settings.ranking.model, "gemini-2.0-flash");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "store = nonsense").unwrap();
        assert!(Settings::load_from(file.path()).is_err());
    }
}
