//! Run configuration and results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::ChatMessage;
use crate::providers::TokenUsage;

/// Per-run settings.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Prior conversation, inserted between the instructions and the input.
    pub history: Vec<ChatMessage>,
    /// Overrides [`Agent::max_steps`](super::Agent::max_steps) when set.
    pub max_steps: Option<usize>,
}

impl RunConfig {
    /// Create an empty run config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide conversation history.
    #[must_use]
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    /// Override the step limit.
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }
}

/// One tool or delegate invocation made during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Tool call identifier.
    pub id: String,
    /// Tool or delegate name.
    pub name: String,
    /// Arguments as sent by the model.
    pub arguments: Value,
    /// Text fed back to the model.
    pub result: String,
    /// Whether the call succeeded.
    pub success: bool,
}

/// Final outcome of an agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Final assistant text.
    pub text: String,
    /// Name of the agent that produced it.
    pub agent_name: String,
    /// Number of model calls made.
    pub steps: usize,
    /// Token usage summed over all steps.
    pub usage: TokenUsage,
    /// Tool and delegate calls, in execution order.
    pub tool_calls: Vec<ToolCallRecord>,
}

impl AgentResponse {
    /// A response with text only, as produced by a single step.
    #[must_use]
    pub fn text_only(agent_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            agent_name: agent_name.into(),
            steps: 1,
            usage: TokenUsage::default(),
            tool_calls: Vec::new(),
        }
    }
}
