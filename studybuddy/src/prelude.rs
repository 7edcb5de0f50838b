//! Common imports.
//!
//! ```rust,ignore
//! use studybuddy::prelude::*;
//! ```

pub use std::sync::Arc;

pub use crate::agent::{Agent, AgentResponse, Delegate, RunConfig, Runner};
pub use crate::calendar::{AddCalendarEvent, GetCalendarEvents, calendar_agent};
pub use crate::chatbot::{ChatbotManager, ChatbotSession, SharedSession};
pub use crate::error::{Error, LlmError, Result};
pub use crate::memory::{Memory, Role, Turn};
pub use crate::message::ChatMessage;
pub use crate::providers::openai::OpenAIClient;
pub use crate::providers::{GenerateOptions, MockModel, Model, ModelResponse, SharedModel};
pub use crate::tool::{DynTool, ToolDefinition, ToolError};
