//! Front ends that connect users to the chatbot.
//!
//! # Available Channels
//!
//! - [`cli::CliChannel`] - Command-line chat loop (always available)
//! - [`telegram::TelegramChannel`] - Telegram bot (requires `telegram` feature)
//!
//! # Feature Flags
//!
//! - `telegram` - Enable Telegram support via teloxide

pub mod cli;

#[cfg(feature = "telegram")]
pub mod telegram;

pub use cli::CliChannel;

#[cfg(feature = "telegram")]
pub use telegram::TelegramChannel;
