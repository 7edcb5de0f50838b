//! Per-user session manager.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::agent::DEFAULT_MAX_STEPS;
use crate::error::Result;
use crate::providers::SharedModel;

use super::session::ChatbotSession;

/// Session handle. The mutex serializes messages of one user.
pub type SharedSession = Arc<Mutex<ChatbotSession>>;

/// Maps user identifiers to their chatbot sessions.
///
/// Sessions are created on first access and live until reset. There is no
/// eviction.
pub struct ChatbotManager {
    model: SharedModel,
    max_steps: usize,
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl std::fmt::Debug for ChatbotManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatbotManager")
            .field("model", &self.model.model_id())
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}

impl ChatbotManager {
    /// Create a manager whose sessions all use `model`.
    #[must_use]
    pub fn new(model: SharedModel) -> Self {
        Self {
            model,
            max_steps: DEFAULT_MAX_STEPS,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Set the step limit for agents of new sessions.
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Return the session of `user_id`, creating it if needed.
    pub async fn get_session(&self, user_id: &str) -> SharedSession {
        if let Some(session) = self.sessions.read().await.get(user_id) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(user_id.to_string()).or_insert_with(|| {
            info!(user_id = %user_id, "creating chatbot session");
            Arc::new(Mutex::new(ChatbotSession::with_max_steps(
                Arc::clone(&self.model),
                self.max_steps,
            )))
        });
        Arc::clone(session)
    }

    /// Drop the session of `user_id`. Returns whether one existed.
    ///
    /// A run already in progress finishes on the detached session; the next
    /// message starts a new one.
    pub async fn reset_session(&self, user_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(user_id).is_some();
        if removed {
            info!(user_id = %user_id, "chatbot session reset");
        } else {
            debug!(user_id = %user_id, "reset requested for unknown session");
        }
        removed
    }

    /// Answer `message` in the session of `user_id`.
    ///
    /// # Errors
    ///
    /// Propagates any failure of the agent run.
    pub async fn get_response(&self, user_id: &str, message: &str) -> Result<String> {
        let session = self.get_session(user_id).await;
        let mut session = session.lock().await;
        session.get_response(message).await
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether there are no live sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Whether `user_id` has a live session.
    pub async fn contains(&self, user_id: &str) -> bool {
        self.sessions.read().await.contains_key(user_id)
    }

    /// Identifiers of all live sessions, sorted.
    pub async fn user_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::LlmError;
    use crate::memory::Turn;
    use crate::message::ChatMessage;
    use crate::providers::{GenerateOptions, MockModel, Model, ModelResponse};

    /// Answers after a short delay and tracks how many calls overlap.
    #[derive(Default)]
    struct SlowModel {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Model for SlowModel {
        fn model_id(&self) -> &str {
            "slow"
        }

        async fn generate(
            &self,
            _messages: Vec<ChatMessage>,
            _options: GenerateOptions,
        ) -> std::result::Result<ModelResponse, LlmError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(ModelResponse::new(ChatMessage::assistant("ok")))
        }
    }

    #[tokio::test]
    async fn test_get_session_is_identity_stable() {
        let manager = ChatbotManager::new(Arc::new(MockModel::echo()));

        let a = manager.get_session("42").await;
        let b = manager.get_session("42").await;
        let c = manager.get_session("7").await;

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(manager.len().await, 2);
        assert_eq!(manager.user_ids().await, vec!["42", "7"]);
    }

    #[tokio::test]
    async fn test_reset_unknown_is_noop() {
        let manager = ChatbotManager::new(Arc::new(MockModel::echo()));
        assert!(!manager.reset_session("nobody").await);
        assert!(manager.is_empty().await);
    }

    #[tokio::test]
    async fn test_reset_creates_fresh_session() {
        let manager = ChatbotManager::new(Arc::new(MockModel::echo()));
        manager.get_response("42", "hi").await.unwrap();
        let before = manager.get_session("42").await;

        assert!(manager.reset_session("42").await);
        assert!(!manager.contains("42").await);

        let after = manager.get_session("42").await;
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after.lock().await.memory().is_empty());
    }

    #[tokio::test]
    async fn test_get_response_records_turns() {
        let manager = ChatbotManager::new(Arc::new(MockModel::echo()));

        let reply = manager.get_response("42", "hello").await.unwrap();

        assert_eq!(reply, "echo: hello");
        let session = manager.get_session("42").await;
        assert_eq!(
            session.lock().await.memory().turns(),
            &[Turn::user("hello"), Turn::assistant("echo: hello")]
        );
    }

    #[tokio::test]
    async fn test_same_user_serialized_different_users_concurrent() {
        let model = Arc::new(SlowModel::default());
        let manager = ChatbotManager::new(model.clone());

        let (a, b) = tokio::join!(
            manager.get_response("42", "one"),
            manager.get_response("42", "two"),
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(model.peak.load(Ordering::SeqCst), 1);
        assert_eq!(manager.get_session("42").await.lock().await.memory().len(), 4);

        model.peak.store(0, Ordering::SeqCst);
        let (a, b) = tokio::join!(
            manager.get_response("1", "x"),
            manager.get_response("2", "y"),
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(model.peak.load(Ordering::SeqCst), 2);
    }
}
