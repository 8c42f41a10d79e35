//! Application configuration management.
//!
//! This module handles loading the application configuration,
//! which includes the Pocket consumer key, redirect URI, pane title, refresh
//! interval, and retry policy.
//!
//! Configuration is stored at `~/.config/pocketpane/config.json`. The
//! `POCKET_CONSUMER_KEY` environment variable overrides the stored key.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::flow::DEFAULT_TITLE;
use crate::auth::RetryPolicy;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "pocketpane";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable holding the consumer key
pub const CONSUMER_KEY_ENV: &str = "POCKET_CONSUMER_KEY";

/// Pocket never calls back into the pane, so any registered URI will do
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost";

/// Seconds between pane refreshes
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5;

/// Longest accepted refresh interval (one day)
const MAX_REFRESH_INTERVAL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub consumer_key: Option<String>,
    pub redirect_uri: String,
    pub title: String,
    pub refresh_interval_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            consumer_key: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            title: DEFAULT_TITLE.to_string(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `POCKET_CONSUMER_KEY` from the environment
    pub fn with_env_overrides(self) -> Self {
        let key = std::env::var(CONSUMER_KEY_ENV).ok();
        self.with_consumer_key_override(key)
    }

    pub fn with_consumer_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.consumer_key = Some(key.trim().to_string());
        }
        self
    }

    /// The consumer key, if a non-blank one is configured
    pub fn consumer_key(&self) -> Option<&str> {
        self.consumer_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Clamped to between one second and one day
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.clamp(1, MAX_REFRESH_INTERVAL_SECS))
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir =
            app_config_dir().ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(CONFIG_FILE))
    }

    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

/// `<config_dir>/pocketpane`, home of both the config and the credential
pub fn app_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join(CONFIG_FILE)).unwrap();

        assert_eq!(config.consumer_key(), None);
        assert_eq!(config.redirect_uri, DEFAULT_REDIRECT_URI);
        assert_eq!(config.title, "Pocket");
        assert_eq!(config.refresh_interval(), Duration::from_secs(5));
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{"consumer_key": "1234-abcd", "retry": {"max_attempts": 20}}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.consumer_key(), Some("1234-abcd"));
        assert_eq!(config.redirect_uri, DEFAULT_REDIRECT_URI);
        assert_eq!(config.retry.max_attempts, Some(20));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse"));
    }

    #[test]
    fn test_consumer_key_override() {
        let config = Config {
            consumer_key: Some("from-file".to_string()),
            ..Config::default()
        };

        let kept = config.clone().with_consumer_key_override(Some("  ".to_string()));
        assert_eq!(kept.consumer_key(), Some("from-file"));

        let kept = config.clone().with_consumer_key_override(None);
        assert_eq!(kept.consumer_key(), Some("from-file"));

        let replaced = config.with_consumer_key_override(Some(" from-env ".to_string()));
        assert_eq!(replaced.consumer_key(), Some("from-env"));
    }

    #[test]
    fn test_blank_consumer_key_is_none() {
        let config = Config {
            consumer_key: Some("   ".to_string()),
            ..Config::default()
        };
        assert_eq!(config.consumer_key(), None);
    }

    #[test]
    fn test_refresh_interval_floor() {
        let config = Config {
            refresh_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_refresh_interval_ceiling() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"refresh_interval_secs": 18446744073709551615}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.refresh_interval_secs, u64::MAX);
        assert_eq!(
            config.refresh_interval(),
            Duration::from_secs(MAX_REFRESH_INTERVAL_SECS)
        );
    }
}
