//! Command-line interface channel.
//!
//! A read-eval-print loop over a single [`ChatbotSession`]. Lines are read
//! until an exit word or end of input; every other non-blank line is
//! answered by the chatbot.

use std::io::Write;

use studybuddy::chatbot::ChatbotSession;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, error};

use crate::error::Result;

/// Words that end the conversation, compared case-insensitively.
pub const EXIT_WORDS: [&str; 4] = ["quit", "exit", "bye", "adios"];

/// Whether `input` is one of the [`EXIT_WORDS`].
#[must_use]
pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    EXIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}

/// CLI channel configuration.
#[derive(Debug, Clone)]
pub struct CliChannelConfig {
    /// Prompt string shown before user input.
    pub prompt: String,
    /// Speaker label of chatbot lines.
    pub bot_label: String,
}

impl Default for CliChannelConfig {
    fn default() -> Self {
        Self {
            prompt: "You: ".to_string(),
            bot_label: "Chatbot".to_string(),
        }
    }
}

impl CliChannelConfig {
    /// Create a new CLI channel config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prompt string.
    #[must_use]
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}

/// Command-line interface channel.
#[derive(Debug, Default)]
pub struct CliChannel {
    config: CliChannelConfig,
}

impl CliChannel {
    /// Create a CLI channel with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a CLI channel with the given configuration.
    #[must_use]
    pub const fn with_config(config: CliChannelConfig) -> Self {
        Self { config }
    }

    /// Run the loop on stdin/stdout.
    pub async fn run_interactive(&self, session: &mut ChatbotSession) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        self.run(session, stdin, &mut stdout).await
    }

    /// Run the loop on arbitrary input and output.
    ///
    /// Returns when an exit word is read or `input` is exhausted. Chatbot
    /// failures are printed and the loop continues.
    pub async fn run<R, W>(
        &self,
        session: &mut ChatbotSession,
        input: R,
        output: &mut W,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let label = &self.config.bot_label;
        let mut lines = input.lines();

        writeln!(output, "{label}: Hello! I'm here to help. Type 'quit' to exit.")?;

        loop {
            write!(output, "{}", self.config.prompt)?;
            output.flush()?;

            let Some(line) = lines.next_line().await? else {
                debug!("end of input");
                writeln!(output)?;
                break;
            };

            if is_exit_command(&line) {
                writeln!(output, "{label}: Goodbye!")?;
                break;
            }

            let message = line.trim();
            if message.is_empty() {
                continue;
            }

            match session.get_response(message).await {
                Ok(response) => writeln!(output, "{label}: {response}")?,
                Err(e) => {
                    error!(error = %e, "failed to get response");
                    writeln!(output, "{label}: Sorry, I encountered an error: {e}")?;
                }
            }
        }

        output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use studybuddy::LlmError;
    use studybuddy::providers::MockModel;

    use super::*;

    async fn run_script(model: MockModel, script: &str) -> (String, ChatbotSession) {
        let mut session = ChatbotSession::new(Arc::new(model));
        let mut output = Vec::new();
        CliChannel::new()
            .run(&mut session, script.as_bytes(), &mut output)
            .await
            .unwrap();
        (String::from_utf8(output).unwrap(), session)
    }

    #[test]
    fn test_exit_words() {
        for word in ["quit", "QUIT", " Exit ", "bye", "AdIoS"] {
            assert!(is_exit_command(word), "{word}");
        }
        assert!(!is_exit_command("quit now"));
        assert!(!is_exit_command(""));
    }

    #[tokio::test]
    async fn test_conversation_then_quit() {
        let (out, session) = run_script(MockModel::echo(), "hello\nQUIT\nignored\n").await;

        assert_eq!(
            out,
            "Chatbot: Hello! I'm here to help. Type 'quit' to exit.\n\
             You: Chatbot: echo: hello\n\
             You: Chatbot: Goodbye!\n"
        );
        assert_eq!(session.memory().len(), 2);
    }

    #[tokio::test]
    async fn test_quit_produces_no_response() {
        let model = MockModel::new();
        let (out, session) = run_script(model, "Quit\n").await;

        assert!(out.ends_with("You: Chatbot: Goodbye!\n"));
        assert!(session.memory().is_empty());
    }

    #[tokio::test]
    async fn test_error_is_reported_and_loop_continues() {
        let model = MockModel::new()
            .with_error(LlmError::network("connection refused"))
            .with_text("back online");
        let (out, session) = run_script(model, "first\n\n   \nsecond\n").await;

        assert!(out.contains("Chatbot: Sorry, I encountered an error: "));
        assert!(out.contains("connection refused"));
        assert!(out.contains("Chatbot: back online\n"));
        assert_eq!(session.memory().len(), 2);
    }

    #[tokio::test]
    async fn test_end_of_input_stops() {
        let (out, _) = run_script(MockModel::echo(), "").await;
        assert!(out.ends_with("You: \n"));
    }
}
