//! Conversation memory for a chatbot session.
//!
//! [`Memory`] keeps the ordered user/assistant turns of one conversation.
//! Tool traffic of a run is not stored; only the user's message and the
//! final answer are.

use serde::{Deserialize, Serialize};

use crate::message::ChatMessage;

/// Speaker of a stored turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user.
    User,
    /// The assistant.
    Assistant,
}

/// One stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who said it.
    pub role: Role,
    /// What was said.
    pub content: String,
}

impl Turn {
    /// A user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    fn to_message(&self) -> ChatMessage {
        match self.role {
            Role::User => ChatMessage::user(&self.content),
            Role::Assistant => ChatMessage::assistant(&self.content),
        }
    }
}

/// Ordered, append-only conversation history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Memory {
    turns: Vec<Turn>,
}

impl Memory {
    /// Empty memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn.
    pub fn add_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Append a completed exchange.
    pub fn add_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(Turn::user(user));
        self.turns.push(Turn::assistant(assistant));
    }

    /// Stored turns, oldest first.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of stored turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether nothing has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// History in the shape the model expects.
    #[must_use]
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        self.turns.iter().map(Turn::to_message).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageRole;

    #[test]
    fn test_exchange_order_and_messages() {
        let mut memory = Memory::new();
        memory.add_exchange("hi", "hello!");
        memory.add_turn(Turn::user("again"));

        assert_eq!(memory.len(), 3);
        assert_eq!(memory.turns()[1], Turn::assistant("hello!"));

        let messages = memory.to_messages();
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[2].text_content(), Some("again"));

        memory.clear();
        assert!(memory.is_empty());
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(Turn::user("x")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "x"}));
    }
}
