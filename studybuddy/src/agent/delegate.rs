//! Explicit delegation between agents.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::Result;
use crate::tool::ToolDefinition;

use super::result::AgentResponse;

/// Something an agent can forward a natural-language task to.
#[async_trait]
pub trait Delegate: Send + Sync {
    /// Unique name, used as the function name offered to the model.
    fn name(&self) -> &str;

    /// What the delegate is good for.
    fn description(&self) -> String;

    /// Function definition offered to the model. Takes a single `task`.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            self.name(),
            self.description(),
            json!({
                "type": "object",
                "properties": {
                    "task": {
                        "type": "string",
                        "description": "The task or question to hand over, in natural language."
                    }
                },
                "required": ["task"]
            }),
        )
    }

    /// Handle the task.
    async fn invoke(&self, query: &str) -> Result<AgentResponse>;
}

/// Shared delegate handle.
pub type SharedDelegate = Arc<dyn Delegate>;

/// Name-indexed collection of delegates.
#[derive(Clone, Default)]
pub struct DelegateRegistry {
    delegates: BTreeMap<String, SharedDelegate>,
}

impl DelegateRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a delegate, returning the one it replaced, if any.
    pub fn register(&mut self, delegate: SharedDelegate) -> Option<SharedDelegate> {
        self.delegates.insert(delegate.name().to_string(), delegate)
    }

    /// Look a delegate up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SharedDelegate> {
        self.delegates.get(name)
    }

    /// Whether a delegate with that name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.delegates.contains_key(name)
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.delegates.keys().map(String::as_str).collect()
    }

    /// Function definitions of all delegates.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.delegates.values().map(|d| d.definition()).collect()
    }

    /// Number of delegates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    /// Whether no delegate is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl std::fmt::Debug for DelegateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
