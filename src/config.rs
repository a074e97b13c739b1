//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! API keys are referenced by env-var name in the config and resolved at
//! runtime, then held as [`SecretString`] so they never end up in logs.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::types::BetVisionError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub scanner: ScannerConfig,
    pub providers: ProvidersConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScannerConfig {
    /// Period of the shared refresh timer.
    pub refresh_interval_secs: u64,
    /// Idle time required after the last search-term change.
    pub search_debounce_ms: u64,
    /// Freshness window of the cached fixtures feed.
    pub fixtures_cache_ttl_secs: u64,
    /// How many unfiltered fixtures to show when no allowed league is live.
    pub fallback_fixture_count: usize,
    pub search_page_size: u32,
    pub league_allow_list: Vec<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    pub football_base_url: String,
    pub football_api_key_env: String,
    pub news_base_url: String,
    pub news_api_key_env: String,
    #[serde(default = "default_news_language")]
    pub news_language: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub path: PathBuf,
}

fn default_news_language() -> String {
    "pt".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

/// Upper bound for `fixtures_cache_ttl_secs` (one week).
pub const MAX_FIXTURES_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall timers or produce empty requests.
    pub fn validate(&self) -> Result<(), BetVisionError> {
        if self.scanner.refresh_interval_secs == 0 {
            return Err(BetVisionError::Config(
                "scanner.refresh_interval_secs must be greater than zero".into(),
            ));
        }
        if self.scanner.search_page_size == 0 {
            return Err(BetVisionError::Config(
                "scanner.search_page_size must be greater than zero".into(),
            ));
        }
        if self.providers.football_base_url.trim().is_empty()
            || self.providers.news_base_url.trim().is_empty()
        {
            return Err(BetVisionError::Config("provider base URLs must not be empty".into()));
        }
        if self.scanner.fixtures_cache_ttl_secs > MAX_FIXTURES_CACHE_TTL_SECS {
            return Err(BetVisionError::Config(format!(
                "scanner.fixtures_cache_ttl_secs must be at most {MAX_FIXTURES_CACHE_TTL_SECS}"
            )));
        }
        if self.scanner.league_allow_list.is_empty() {
            warn!("league_allow_list is empty; every refresh will use the fallback slice");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.scanner.refresh_interval_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.scanner.search_debounce_ms)
    }

    /// Freshness window of the fixtures cache, clamped to
    /// [`MAX_FIXTURES_CACHE_TTL_SECS`].
    pub fn fixtures_cache_ttl(&self) -> chrono::Duration {
        let secs = self.scanner.fixtures_cache_ttl_secs.min(MAX_FIXTURES_CACHE_TTL_SECS);
        chrono::Duration::seconds(secs as i64)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.providers.request_timeout_secs)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Resolve an API key, returning `None` (with a warning) when unset.
    pub fn resolve_secret(env_name: &str) -> Option<SecretString> {
        match Self::resolve_env(env_name) {
            Ok(value) if !value.trim().is_empty() => Some(SecretString::new(value)),
            _ => {
                warn!(env = env_name, "API key not configured; provider will fall back");
                None
            }
        }
    }
}
