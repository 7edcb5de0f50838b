//! StudyBuddy is a small agent runtime wired into a study assistant.
//!
//! The crate is organized bottom-up:
//!
//! - [`message`] / [`providers`] - chat messages and the [`Model`](providers::Model)
//!   abstraction over LLM backends (OpenAI-compatible, plus a scripted mock)
//! - [`tool`] - the [`DynTool`](tool::DynTool) interface agents call into
//! - [`agent`] - agent configuration, the [`Runner`](agent::Runner) loop and
//!   explicit delegation between agents
//! - [`memory`] - per-session turn history
//! - [`calendar`] - the mocked calendar tools and the calendar sub-agent
//! - [`chatbot`] - chatbot sessions and the per-user session manager
//!
//! # Example
//!
//! ```rust,ignore
//! use studybuddy::prelude::*;
//!
//! let model: SharedModel = Arc::new(OpenAIClient::from_env()?.completion_model("gpt-4o-mini"));
//! let manager = ChatbotManager::new(model);
//! let reply = manager.get_response("42", "When is my next meeting?").await?;
//! ```

pub mod agent;
pub mod calendar;
pub mod chatbot;
pub mod error;
pub mod memory;
pub mod message;
pub mod prelude;
pub mod providers;
pub mod tool;

pub use error::{Error, LlmError, LlmErrorKind, Result};
