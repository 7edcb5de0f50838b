//! Telegram channel implementation using teloxide.
//!
//! Three handlers sit on top of a shared [`ChatbotManager`]:
//!
//! - `/start` replies with a static help text
//! - `/reset` drops the sender's session
//! - any other text message is answered by the sender's session
//!
//! Sessions are keyed by the sender's numeric Telegram user id.
//!
//! # Setup
//!
//! 1. Create a bot via [@BotFather](https://t.me/botfather)
//! 2. Put the token in `TELEGRAM_BOT_TOKEN` or the config file
//! 3. Run `studybuddy telegram`

use std::sync::Arc;

use futures::future::BoxFuture;
use studybuddy::chatbot::ChatbotManager;
use teloxide::error_handlers::ErrorHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, User};
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

use crate::config::{BotConfig, TELEGRAM_MAX_MESSAGE_LENGTH};
use crate::error::{ChannelError, ChannelResult, ConfigResult};

/// Reply after `/reset`.
pub const RESET_TEXT: &str = "✅ Conversation history cleared! Let's start fresh.";

/// Reply when the chatbot fails on a message.
pub const FALLBACK_TEXT: &str =
    "Sorry, I encountered an error processing your message. Please try again.";

/// Telegram channel configuration.
#[derive(Debug, Clone)]
pub struct TelegramChannelConfig {
    /// Bot token from @BotFather.
    pub token: String,
    /// Maximum message length before splitting.
    pub max_message_length: usize,
}

impl TelegramChannelConfig {
    /// Create a new Telegram channel config with the given token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            max_message_length: TELEGRAM_MAX_MESSAGE_LENGTH,
        }
    }

    /// Build from the bot configuration.
    ///
    /// Fails when no token is configured.
    pub fn from_bot_config(config: &BotConfig) -> ConfigResult<Self> {
        let token = config.require_telegram_token()?;
        Ok(Self::new(token).max_message_length(config.telegram.max_message_length))
    }

    /// Set the maximum message length, capped at Telegram's limit.
    #[must_use]
    pub fn max_message_length(mut self, len: usize) -> Self {
        self.max_message_length = len.clamp(1, TELEGRAM_MAX_MESSAGE_LENGTH);
        self
    }
}

/// Supported bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    /// Show the welcome message.
    #[command(description = "Show this message")]
    Start,
    /// Forget the conversation.
    #[command(description = "Clear conversation history")]
    Reset,
}

/// Welcome text for `/start`.
#[must_use]
pub fn start_text(first_name: &str) -> String {
    format!(
        "Hello {first_name}! 👋\n\n\
         I'm your StudyBuddy assistant. I can help you with:\n\
         • Study questions and concepts\n\
         • Calendar management\n\
         • Planning your schedule\n\n\
         Just send me a message to get started!\n\n\
         Commands:\n\
         /start - Show this message\n\
         /reset - Clear conversation history"
    )
}

/// Session key of a Telegram user.
#[must_use]
pub fn session_key(user: &User) -> String {
    user.id.0.to_string()
}

/// Answer `text` for `user_id`, turning failures into [`FALLBACK_TEXT`].
///
/// A blank answer counts as a failure, since Telegram refuses empty messages.
pub async fn respond(manager: &ChatbotManager, user_id: &str, text: &str) -> String {
    match manager.get_response(user_id, text).await {
        Ok(response) if response.trim().is_empty() => {
            warn!(user_id = %user_id, "chatbot returned an empty response");
            FALLBACK_TEXT.to_string()
        }
        Ok(response) => response,
        Err(e) => {
            error!(user_id = %user_id, error = %e, "error processing message");
            FALLBACK_TEXT.to_string()
        }
    }
}

/// Split a message into chunks of at most `max_len` characters.
///
/// Splits on line boundaries where possible; a single line longer than
/// `max_len` is cut at character boundaries. Blank chunks are never
/// produced, so a blank `text` yields no chunks at all.
#[must_use]
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    if text.trim().is_empty() {
        return Vec::new();
    }
    if text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    // A chunk holding a single empty line is started but still empty.
    let mut started = false;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let needed = if started {
            current_len + 1 + line_len
        } else {
            line_len
        };

        if needed <= max_len {
            if started {
                current.push('\n');
            }
            current.push_str(line);
            current_len = needed;
            started = true;
            continue;
        }

        if started {
            push_chunk(&mut chunks, std::mem::take(&mut current));
            current_len = 0;
            started = false;
        }

        if line_len > max_len {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_len) {
                push_chunk(&mut chunks, piece.iter().collect());
            }
        } else {
            current.push_str(line);
            current_len = line_len;
            started = true;
        }
    }

    if started {
        push_chunk(&mut chunks, current);
    }

    chunks
}

fn push_chunk(chunks: &mut Vec<String>, chunk: String) {
    if !chunk.trim().is_empty() {
        chunks.push(chunk);
    }
}

/// Send `chunks` to `chat_id` in order, stopping at the first failure.
async fn send_chunks(bot: &Bot, chat_id: ChatId, chunks: Vec<String>) -> ChannelResult<()> {
    for chunk in chunks {
        bot.send_message(chat_id, chunk)
            .await
            .map_err(|e| ChannelError::send(e.to_string()))?;
    }
    Ok(())
}

/// Logs dispatch errors without replying to anyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorHandler;

impl<E> ErrorHandler<E> for TracingErrorHandler
where
    E: std::fmt::Debug + Send + 'static,
{
    fn handle_error(self: Arc<Self>, error: E) -> BoxFuture<'static, ()> {
        error!(error = ?error, "telegram update caused an error");
        Box::pin(async {})
    }
}

/// Telegram channel: owns the bot and dispatches updates to the handlers.
pub struct TelegramChannel {
    config: Arc<TelegramChannelConfig>,
    manager: Arc<ChatbotManager>,
}

impl std::fmt::Debug for TelegramChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramChannel")
            .field("max_message_length", &self.config.max_message_length)
            .finish_non_exhaustive()
    }
}

impl TelegramChannel {
    /// Create a channel answering through `manager`.
    #[must_use]
    pub fn new(config: TelegramChannelConfig, manager: Arc<ChatbotManager>) -> Self {
        Self {
            config: Arc::new(config),
            manager,
        }
    }

    /// Poll Telegram and handle updates until Ctrl+C.
    pub async fn run(self) -> ChannelResult<()> {
        if self.config.token.trim().is_empty() {
            return Err(ChannelError::Config("empty bot token".to_string()));
        }

        let bot = Bot::new(&self.config.token);

        let me = bot
            .get_me()
            .await
            .map_err(|e| ChannelError::start(format!("failed to reach Telegram: {e}")))?;
        info!(username = %me.username(), "Starting Telegram bot");

        if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
            warn!(error = %e, "failed to register bot commands");
        }

        let handler = Update::filter_message()
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(handle_command),
            )
            .branch(
                Message::filter_text()
                    .filter(|text: String| !text.starts_with('/'))
                    .endpoint(handle_text),
            );

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![Arc::clone(&self.manager), Arc::clone(&self.config)])
            .error_handler(Arc::new(TracingErrorHandler))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram bot stopped");
        Ok(())
    }
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    manager: Arc<ChatbotManager>,
) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, start_text(&user.first_name))
                .await?;
        }
        Command::Reset => {
            manager.reset_session(&session_key(user)).await;
            bot.send_message(msg.chat.id, RESET_TEXT).await?;
        }
    }
    Ok(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    text: String,
    manager: Arc<ChatbotManager>,
    config: Arc<TelegramChannelConfig>,
) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = session_key(user);
    debug!(user_id = %user_id, "message received");

    if let Err(e) = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await {
        debug!(error = %e, "failed to send typing action");
    }

    let reply = respond(&manager, &user_id, &text).await;
    let chunks = split_message(&reply, config.max_message_length);
    if let Err(e) = send_chunks(&bot, msg.chat.id, chunks).await {
        warn!(user_id = %user_id, error = %e, "failed to deliver reply");
        bot.send_message(msg.chat.id, FALLBACK_TEXT).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use studybuddy::LlmError;
    use studybuddy::providers::MockModel;

    use super::*;

    #[test]
    fn test_config() {
        let config = TelegramChannelConfig::new("123:abc").max_message_length(10_000);
        assert_eq!(config.max_message_length, 4096);

        let mut bot_config = BotConfig::default();
        assert!(TelegramChannelConfig::from_bot_config(&bot_config).is_err());
        bot_config.telegram.token = Some("123:abc".to_string());
        bot_config.telegram.max_message_length = 100;
        let config = TelegramChannelConfig::from_bot_config(&bot_config).unwrap();
        assert_eq!(config.token, "123:abc");
        assert_eq!(config.max_message_length, 100);
    }

    #[test]
    fn test_commands_parse() {
        assert!(matches!(
            Command::parse("/start", "studybuddy_bot"),
            Ok(Command::Start)
        ));
        assert!(matches!(
            Command::parse("/reset", "studybuddy_bot"),
            Ok(Command::Reset)
        ));
        assert!(Command::parse("/unknown", "studybuddy_bot").is_err());
        assert_eq!(Command::bot_commands().len(), 2);
    }

    #[test]
    fn test_start_text() {
        let text = start_text("Ada");
        assert!(text.starts_with("Hello Ada! 👋\n\n"));
        assert!(text.ends_with("/reset - Clear conversation history"));
    }

    #[test]
    fn test_split_message() {
        assert_eq!(split_message("Hello, world!", 100), vec!["Hello, world!"]);

        let chunks = split_message("Line 1\nLine 2\nLine 3\nLine 4", 15);
        assert_eq!(chunks, vec!["Line 1\nLine 2", "Line 3\nLine 4"]);

        let long = "é".repeat(10);
        let chunks = split_message(&long, 4);
        assert_eq!(chunks, vec!["éééé", "éééé", "éé"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    #[test]
    fn test_split_message_never_yields_blank_chunks() {
        assert!(split_message("", 4096).is_empty());
        assert!(split_message(" \n\t ", 4096).is_empty());

        let chunks = split_message("abcde\n \nfghij", 5);
        assert_eq!(chunks, vec!["abcde", "fghij"]);
    }

    #[test]
    fn test_split_keeps_blank_line_opening_a_chunk() {
        let chunks = split_message("aaaa\n\nbb", 4);
        assert_eq!(chunks, vec!["aaaa", "\nbb"]);
    }

    #[test]
    fn test_split_respects_telegram_limit() {
        let text = "a".repeat(5000);
        let chunks = split_message(&text, TELEGRAM_MAX_MESSAGE_LENGTH);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4096);
        assert_eq!(chunks.concat(), text);
    }

    #[tokio::test]
    async fn test_respond_success_and_fallback() {
        let model = MockModel::new()
            .with_text("Photosynthesis turns light into chemical energy.")
            .with_error(LlmError::network("timeout"));
        let manager = ChatbotManager::new(Arc::new(model));

        let ok = respond(&manager, "42", "What is photosynthesis?").await;
        assert_eq!(ok, "Photosynthesis turns light into chemical energy.");

        let failed = respond(&manager, "42", "And respiration?").await;
        assert_eq!(failed, FALLBACK_TEXT);

        let session = manager.get_session("42").await;
        assert_eq!(session.lock().await.memory().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_response_falls_back() {
        let model = MockModel::new().with_text("").with_text("  \n ");
        let manager = ChatbotManager::new(Arc::new(model));

        for _ in 0..2 {
            let reply = respond(&manager, "42", "hi").await;
            assert_eq!(reply, FALLBACK_TEXT);
            assert_eq!(
                split_message(&reply, TELEGRAM_MAX_MESSAGE_LENGTH),
                vec![FALLBACK_TEXT]
            );
        }
    }
}
