//! Scripted model for tests and offline runs.
//!
//! [`MockModel`] replays a queue of prepared responses in order and records
//! every request it receives. When the queue runs dry it either echoes the
//! last user message (echo mode) or fails.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::LlmError;
use crate::message::{ChatMessage, MessageRole, ToolCall};
use crate::providers::{GenerateOptions, Model, ModelResponse};

/// A request observed by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Messages sent to the model.
    pub messages: Vec<ChatMessage>,
    /// Names of tools offered to the model.
    pub tool_names: Vec<String>,
}

#[derive(Debug, Default)]
struct MockState {
    responses: VecDeque<Result<ModelResponse, LlmError>>,
    requests: Vec<RecordedRequest>,
}

/// Scripted [`Model`] implementation.
#[derive(Debug, Default)]
pub struct MockModel {
    state: Mutex<MockState>,
    echo: bool,
}

impl MockModel {
    /// Create a mock with an empty script that fails once exhausted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that answers `echo: <last user message>` when its
    /// script is empty.
    #[must_use]
    pub fn echo() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    fn push(&self, response: Result<ModelResponse, LlmError>) {
        self.lock().responses.push_back(response);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Queue a plain text answer.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.push(Ok(ModelResponse::new(ChatMessage::assistant(text))));
        self
    }

    /// Queue an answer that requests a single tool call.
    #[must_use]
    pub fn with_tool_call(
        self,
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: &Value,
    ) -> Self {
        self.with_tool_calls(vec![ToolCall::new(id, name, arguments)])
    }

    /// Queue an answer that requests several tool calls at once.
    #[must_use]
    pub fn with_tool_calls(self, calls: Vec<ToolCall>) -> Self {
        self.push(Ok(ModelResponse::new(ChatMessage::assistant_tool_calls(
            calls,
        ))));
        self
    }

    /// Queue a failure.
    #[must_use]
    pub fn with_error(self, error: LlmError) -> Self {
        self.push(Err(error));
        self
    }

    /// All requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Number of scripted responses not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lock().responses.len()
    }
}

#[async_trait]
impl Model for MockModel {
    fn model_id(&self) -> &str {
        "mock"
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerateOptions,
    ) -> Result<ModelResponse, LlmError> {
        let mut state = self.lock();

        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .and_then(|m| m.content.clone())
            .unwrap_or_default();

        state.requests.push(RecordedRequest {
            messages,
            tool_names: options
                .tools
                .unwrap_or_default()
                .into_iter()
                .map(|t| t.name)
                .collect(),
        });

        match state.responses.pop_front() {
            Some(response) => response,
            None if self.echo => Ok(ModelResponse::new(ChatMessage::assistant(format!(
                "echo: {last_user}"
            )))),
            None => Err(LlmError::provider("mock", "no scripted response left")),
        }
    }
}
