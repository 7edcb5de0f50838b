//! A single conversation with the study assistant.

use std::sync::Arc;

use crate::agent::{Agent, AgentResponse, DEFAULT_MAX_STEPS, RunConfig, Runner};
use crate::calendar::calendar_agent;
use crate::error::Result;
use crate::memory::Memory;
use crate::providers::SharedModel;

/// Name of the main agent.
pub const MAIN_AGENT_NAME: &str = "studybuddy";

/// Instructions of the main agent.
pub const MAIN_INSTRUCTIONS: &str = "You are a helpful study assistant for university students.";

/// Memory plus the main agent for one user.
pub struct ChatbotSession {
    model: SharedModel,
    max_steps: usize,
    memory: Memory,
    agent: Agent,
}

impl std::fmt::Debug for ChatbotSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatbotSession")
            .field("agent", &self.agent.name)
            .field("turns", &self.memory.len())
            .finish_non_exhaustive()
    }
}

impl ChatbotSession {
    /// Start a fresh session backed by `model`.
    #[must_use]
    pub fn new(model: SharedModel) -> Self {
        Self::with_max_steps(model, DEFAULT_MAX_STEPS)
    }

    /// Start a fresh session with a custom step limit for its agents.
    #[must_use]
    pub fn with_max_steps(model: SharedModel, max_steps: usize) -> Self {
        let agent = build_agent(&model, max_steps);
        Self {
            model,
            max_steps,
            memory: Memory::new(),
            agent,
        }
    }

    /// Answer `message` and record the exchange.
    ///
    /// # Errors
    ///
    /// Propagates any failure of the agent run. Memory is left untouched in
    /// that case.
    pub async fn get_response(&mut self, message: &str) -> Result<String> {
        self.respond(message).await.map(|r| r.text)
    }

    /// Like [`get_response`](Self::get_response) but returns the full run
    /// result, including tool calls and usage.
    ///
    /// # Errors
    ///
    /// Propagates any failure of the agent run.
    pub async fn respond(&mut self, message: &str) -> Result<AgentResponse> {
        let config = RunConfig::new().with_history(self.memory.to_messages());
        let response = Runner::run(&self.agent, message, config).await?;
        self.memory.add_exchange(message, response.text.as_str());
        Ok(response)
    }

    /// Discard memory and agent, rebuilding both.
    pub fn reset(&mut self) {
        self.memory = Memory::new();
        self.agent = build_agent(&self.model, self.max_steps);
    }

    /// Conversation so far.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// The main agent.
    #[must_use]
    pub const fn agent(&self) -> &Agent {
        &self.agent
    }
}

fn build_agent(model: &SharedModel, max_steps: usize) -> Agent {
    let calendar = calendar_agent(Arc::clone(model)).max_steps(max_steps);
    Agent::new(MAIN_AGENT_NAME)
        .instructions(MAIN_INSTRUCTIONS)
        .provider(Arc::clone(model))
        .max_steps(max_steps)
        .can_call(Arc::new(calendar))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::LlmError;
    use crate::calendar::{CALENDAR_AGENT_NAME, get_calendar_events};
    use crate::memory::{Role, Turn};
    use crate::message::MessageRole;
    use crate::providers::MockModel;

    #[tokio::test]
    async fn test_get_response_appends_two_turns() {
        let model = Arc::new(MockModel::new().with_text("Sure, let's study."));
        let mut session = ChatbotSession::new(model);

        let text = session.get_response("Help me with calculus").await.unwrap();

        assert_eq!(text, "Sure, let's study.");
        assert_eq!(
            session.memory().turns(),
            &[
                Turn::user("Help me with calculus"),
                Turn::assistant("Sure, let's study.")
            ]
        );
    }

    #[tokio::test]
    async fn test_history_is_replayed() {
        let model = Arc::new(MockModel::echo());
        let mut session = ChatbotSession::new(model.clone());

        session.get_response("first").await.unwrap();
        let second = session.get_response("second").await.unwrap();

        assert_eq!(second, "echo: second");
        let messages = &model.requests()[1].messages;
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].text_content(), Some(MAIN_INSTRUCTIONS));
        assert_eq!(messages[1].text_content(), Some("first"));
        assert_eq!(messages[2].text_content(), Some("echo: first"));
        assert_eq!(messages[3].text_content(), Some("second"));
        assert_eq!(session.memory().len(), 4);
    }

    #[tokio::test]
    async fn test_failure_leaves_memory_untouched() {
        let model = Arc::new(MockModel::new().with_error(LlmError::network("offline")));
        let mut session = ChatbotSession::new(model);

        assert!(session.get_response("hello").await.is_err());
        assert!(session.memory().is_empty());
    }

    #[tokio::test]
    async fn test_calendar_question_is_delegated() {
        // Main agent delegates, calendar agent calls its tool, both answer.
        let model = Arc::new(
            MockModel::new()
                .with_tool_call(
                    "d1",
                    CALENDAR_AGENT_NAME,
                    &json!({"task": "List events on 2024-01-01"}),
                )
                .with_tool_call("c1", "get_calendar_events", &json!({"date": "2024-01-01"}))
                .with_text("Bob at 10 AM and Alice at 1 PM.")
                .with_text("You meet Bob at 10 AM and Alice at 1 PM."),
        );
        let mut session = ChatbotSession::new(model.clone());

        let response = session
            .respond("What's on my calendar for 2024-01-01?")
            .await
            .unwrap();

        assert_eq!(response.text, "You meet Bob at 10 AM and Alice at 1 PM.");
        assert_eq!(response.tool_calls[0].name, CALENDAR_AGENT_NAME);
        assert_eq!(response.tool_calls[0].result, "Bob at 10 AM and Alice at 1 PM.");

        let requests = model.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].tool_names, vec![CALENDAR_AGENT_NAME]);
        let tool_message = requests[2].messages.last().unwrap();
        assert_eq!(
            tool_message.text_content(),
            Some(get_calendar_events("2024-01-01").as_str())
        );
        assert_eq!(session.memory().turns()[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_reset_discards_memory() {
        let model = Arc::new(MockModel::echo());
        let mut session = ChatbotSession::new(model);
        session.get_response("hi").await.unwrap();

        session.reset();

        assert!(session.memory().is_empty());
        assert_eq!(session.agent().name, MAIN_AGENT_NAME);
        assert!(session.agent().delegates.contains(CALENDAR_AGENT_NAME));
    }
}
