//! Chatbot sessions and the per-user session manager.
//!
//! A [`ChatbotSession`] pairs one conversation [`Memory`](crate::memory::Memory)
//! with the main study agent. The [`ChatbotManager`] maps user identifiers to
//! sessions, creating them on first use.

mod manager;
mod session;

pub use manager::{ChatbotManager, SharedSession};
pub use session::{ChatbotSession, MAIN_AGENT_NAME, MAIN_INSTRUCTIONS};
