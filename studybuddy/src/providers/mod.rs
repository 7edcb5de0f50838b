//! LLM provider implementations.
//!
//! Each provider implements the [`Model`] trait, so agents can switch
//! backends without changing their configuration.
//!
//! # Supported Providers
//!
//! - **`OpenAI`**: Chat Completions API and compatible endpoints
//! - **Mock**: scripted responses for tests and offline runs
//!
//! # Example
//!
//! ```rust,ignore
//! use studybuddy::providers::{Model, GenerateOptions, OpenAIClient};
//! use studybuddy::message::ChatMessage;
//!
//! let client = OpenAIClient::from_env()?;
//! let model = client.completion_model("gpt-4o-mini");
//! let response = model.generate(vec![ChatMessage::user("Hello!")], GenerateOptions::new()).await?;
//! println!("{}", response.text().unwrap_or_default());
//! ```

pub mod mock;
pub mod openai;

mod types;

pub use mock::MockModel;
pub use openai::OpenAIClient;
pub use types::{GenerateOptions, ModelResponse, TokenUsage, ToolChoice};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::message::ChatMessage;

/// The core trait for language model implementations.
#[async_trait]
pub trait Model: Send + Sync {
    /// Get the model identifier (e.g., "gpt-4o-mini").
    fn model_id(&self) -> &str;

    /// Short provider name used in logs and errors.
    fn provider_name(&self) -> &'static str {
        "unknown"
    }

    /// Generate a response for the given messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the response cannot be parsed.
    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerateOptions,
    ) -> Result<ModelResponse, LlmError>;
}

/// Shared, type-erased model handle.
pub type SharedModel = Arc<dyn Model>;
