//! `OpenAI` Chat Completions provider.

mod client;
mod completion;

pub use client::{OPENAI_API_BASE_URL, OpenAIClient, OpenAIClientBuilder};
pub use completion::{CompletionModel, GPT_4O_MINI};
