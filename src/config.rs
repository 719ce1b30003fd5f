use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const API_URL_ENV: &str = "DUGTRIO_API_URL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// The sentiment endpoint may have to wake a sleeping host.
    #[serde(default = "default_sentiment_timeout")]
    pub sentiment_timeout_secs: u64,
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            sentiment_timeout_secs: default_sentiment_timeout(),
            lookup_timeout_secs: default_lookup_timeout(),
        }
    }
}

/// Per-resource request budgets handed to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub sentiment: Duration,
    pub lookup: Duration,
}

impl BackendConfig {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            sentiment: Duration::from_secs(self.sentiment_timeout_secs),
            lookup: Duration::from_secs(self.lookup_timeout_secs),
        }
    }
}

fn default_base_url() -> String {
    "https://dugtrio-backend.onrender.com/api".to_string()
}

fn default_sentiment_timeout() -> u64 {
    180
}

fn default_lookup_timeout() -> u64 {
    60
}

impl Config {
    /// Load from an optional TOML file plus the process environment.
    /// A missing file is fine; a missing bot token is not.
    pub fn load(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let content = if path.exists() {
            Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?,
            )
        } else {
            None
        };

        Self::from_sources(
            content.as_deref(),
            std::env::var(TOKEN_ENV).ok(),
            std::env::var(API_URL_ENV).ok(),
        )
    }

    pub fn from_sources(
        content: Option<&str>,
        env_token: Option<String>,
        env_api_url: Option<String>,
    ) -> Result<Self> {
        let mut config: Config = match content {
            Some(text) => toml::from_str(text).context("Failed to parse config file")?,
            None => Config::default(),
        };

        if let Some(token) = env_token.filter(|t| !t.trim().is_empty()) {
            config.telegram.bot_token = token;
        }
        if let Some(url) = env_api_url.filter(|u| !u.trim().is_empty()) {
            config.backend.base_url = url;
        }

        if config.telegram.bot_token.trim().is_empty() {
            anyhow::bail!(
                "Telegram bot token not set. Set {} or [telegram] bot_token in the config file.",
                TOKEN_ENV
            );
        }

        reqwest::Url::parse(&config.backend.base_url).with_context(|| {
            format!("Invalid backend base_url: {}", config.backend.base_url)
        })?;

        Ok(config)
    }
}
