//! Configuration for the StudyBuddy front ends.
//!
//! Settings come from a JSON file (default `~/.studybuddy/config.json`),
//! then environment variables override individual values:
//!
//! | Variable             | Field                  |
//! |----------------------|------------------------|
//! | `OPENAI_API_KEY`     | `provider.api_key`     |
//! | `OPENAI_BASE_URL`    | `provider.base_url`    |
//! | `STUDYBUDDY_MODEL`   | `provider.model`       |
//! | `TELEGRAM_BOT_TOKEN` | `telegram.token`       |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Environment variable holding the `OpenAI` API key.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable holding the API base URL.
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
/// Environment variable holding the model id.
pub const ENV_MODEL: &str = "STUDYBUDDY_MODEL";
/// Environment variable holding the Telegram bot token.
pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_BOT_TOKEN";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Telegram's limit on the length of one text message.
pub const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// LLM provider settings.
    pub provider: ProviderConfig,
    /// Telegram settings.
    pub telegram: TelegramConfig,
    /// Agent settings.
    pub agent: AgentConfig,
}

/// LLM provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API key.
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API.
    pub base_url: Option<String>,
    /// Model id.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: None,
        }
    }
}

/// Telegram settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub token: Option<String>,
    /// Longest reply sent as one message; longer replies are split.
    pub max_message_length: usize,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            max_message_length: TELEGRAM_MAX_MESSAGE_LENGTH,
        }
    }
}

/// Agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum model calls per message.
    pub max_steps: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: studybuddy::agent::DEFAULT_MAX_STEPS,
        }
    }
}

impl BotConfig {
    /// Override file values with environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|key| std::env::var(key).ok());
    }

    /// Override file values using `lookup` as the environment.
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = get(ENV_BASE_URL) {
            self.provider.base_url = Some(url);
        }
        if let Some(model) = get(ENV_MODEL) {
            self.provider.model = model;
        }
        if let Some(token) = get(ENV_TELEGRAM_TOKEN) {
            self.telegram.token = Some(token);
        }
    }

    /// The API key, or an error naming where to set it.
    pub fn require_api_key(&self) -> ConfigResult<&str> {
        non_empty(self.provider.api_key.as_deref()).ok_or_else(|| {
            ConfigError::missing(format!(
                "{ENV_API_KEY} not found in environment variables. Please set it in your environment or config file."
            ))
        })
    }

    /// The Telegram bot token, or an error naming where to set it.
    pub fn require_telegram_token(&self) -> ConfigResult<&str> {
        non_empty(self.telegram.token.as_deref()).ok_or_else(|| {
            ConfigError::missing(format!(
                "{ENV_TELEGRAM_TOKEN} not found in environment variables. Please set it in your environment or config file."
            ))
        })
    }

    /// Check values that would only fail later at runtime.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.provider.model.trim().is_empty() {
            return Err(ConfigError::invalid("provider.model must not be empty"));
        }
        if self.agent.max_steps == 0 {
            return Err(ConfigError::invalid("agent.max_steps must be at least 1"));
        }
        if self.telegram.max_message_length == 0
            || self.telegram.max_message_length > TELEGRAM_MAX_MESSAGE_LENGTH
        {
            return Err(ConfigError::invalid(format!(
                "telegram.max_message_length must be between 1 and {TELEGRAM_MAX_MESSAGE_LENGTH}"
            )));
        }
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Default configuration file location.
#[must_use]
pub fn config_path() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".studybuddy")
        .join("config.json")
}

/// Load configuration from `path`, or from [`config_path`] if `None`.
///
/// A missing default file yields the defaults; a missing explicit file is an
/// error. Environment overrides are not applied here.
pub async fn load_config(path: Option<&Path>) -> ConfigResult<BotConfig> {
    let explicit = path.is_some();
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(BotConfig::default());
        }
        Err(e) => return Err(e.into()),
    };

    let config: BotConfig = serde_json::from_str(&content)?;
    config.validate()?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Mask a secret for display, keeping the first and last few characters.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
