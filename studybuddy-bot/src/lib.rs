//! StudyBuddy front ends: an interactive CLI and a Telegram bot.
//!
//! Both front ends talk to the [`studybuddy`] library. The CLI drives a
//! single [`ChatbotSession`](studybuddy::chatbot::ChatbotSession); the
//! Telegram bot keeps one session per user through a
//! [`ChatbotManager`](studybuddy::chatbot::ChatbotManager).
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use studybuddy_bot::prelude::*;
//!
//! let mut config = load_config(None).await?;
//! config.apply_env_overrides();
//! let model = build_model(&config)?;
//! let mut session = ChatbotSession::new(model);
//! CliChannel::new().run_interactive(&mut session).await?;
//! ```
//!
//! # Features
//!
//! - `telegram` - Enable Telegram bot support via teloxide

pub mod channels;
pub mod config;
pub mod error;

use std::sync::Arc;

use studybuddy::providers::SharedModel;
use studybuddy::providers::openai::OpenAIClient;

use crate::config::BotConfig;
use crate::error::Result;

/// Build the chat model described by `config`.
///
/// # Errors
///
/// Fails when no API key is configured or the HTTP client cannot be built.
pub fn build_model(config: &BotConfig) -> Result<SharedModel> {
    let api_key = config.require_api_key()?;

    let mut builder = OpenAIClient::builder().api_key(api_key);
    if let Some(url) = &config.provider.base_url {
        builder = builder.base_url(url);
    }
    if let Some(secs) = config.provider.timeout_secs {
        builder = builder.timeout_secs(secs);
    }

    let client = builder.build()?;
    Ok(Arc::new(client.completion_model(&config.provider.model)))
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::build_model;

    // Error types
    pub use crate::error::{
        BotError, ChannelError, ChannelResult, ConfigError, ConfigResult, Result,
    };

    // Channels
    pub use crate::channels::CliChannel;
    pub use crate::channels::cli::{CliChannelConfig, EXIT_WORDS, is_exit_command};
    #[cfg(feature = "telegram")]
    pub use crate::channels::{TelegramChannel, telegram::TelegramChannelConfig};

    // Config
    pub use crate::config::{
        AgentConfig, BotConfig, ProviderConfig, TelegramConfig, config_path, load_config,
        mask_secret,
    };

    // Chatbot
    pub use studybuddy::chatbot::{ChatbotManager, ChatbotSession};
}
