//! Agent configuration.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::providers::SharedModel;
use crate::tool::{BoxedTool, DynTool, ToolDefinition};

use super::delegate::{Delegate, DelegateRegistry, SharedDelegate};
use super::result::{AgentResponse, RunConfig};
use super::runner::Runner;

/// Default upper bound on model calls per run.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// A configured LLM-driven task executor.
///
/// Built with a fluent API; the [`Runner`] reads it without mutating it, so
/// one agent can serve concurrent runs.
pub struct Agent {
    /// Agent name, also the function name when offered as a delegate.
    pub name: String,
    /// What the agent does, shown to parent agents.
    pub description: String,
    /// System instructions.
    pub instructions: String,
    /// Model used for this agent's runs.
    pub provider: Option<SharedModel>,
    /// Callable tools.
    pub tools: Vec<BoxedTool>,
    /// Agents this agent may delegate to.
    pub delegates: DelegateRegistry,
    /// Maximum model calls per run.
    pub max_steps: usize,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field(
                "model",
                &self.provider.as_ref().map(|p| p.model_id().to_string()),
            )
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("delegates", &self.delegates)
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Create an agent with the given name and no instructions.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instructions: String::new(),
            provider: None,
            tools: Vec::new(),
            delegates: DelegateRegistry::new(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Set the system instructions.
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Set the description shown to agents that delegate to this one.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Bind the model.
    #[must_use]
    pub fn provider(mut self, model: SharedModel) -> Self {
        self.provider = Some(model);
        self
    }

    /// Add a tool.
    #[must_use]
    pub fn tool(mut self, tool: impl DynTool + 'static) -> Self {
        self.tools.push(Box::new(tool));
        self
    }

    /// Set the maximum number of model calls per run.
    #[must_use]
    pub const fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Grant this agent the ability to delegate to `delegate`.
    ///
    /// A delegate with the same name replaces the previous one.
    #[must_use]
    pub fn can_call(mut self, delegate: SharedDelegate) -> Self {
        let name = delegate.name().to_string();
        if self.delegates.register(delegate).is_some() {
            warn!(agent = %self.name, delegate = %name, "replaced existing delegate");
        }
        self
    }

    /// Find a tool by name.
    #[must_use]
    pub fn find_tool(&self, name: &str) -> Option<&BoxedTool> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Definitions of everything the model may call: tools, then delegates.
    #[must_use]
    pub fn callable_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| t.definition())
            .chain(self.delegates.definitions())
            .collect()
    }
}

#[async_trait]
impl Delegate for Agent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        if self.description.is_empty() {
            format!("Delegate a task to the '{}' agent.", self.name)
        } else {
            self.description.clone()
        }
    }

    async fn invoke(&self, query: &str) -> Result<AgentResponse> {
        Runner::run(self, query, RunConfig::default()).await
    }
}

impl From<Agent> for SharedDelegate {
    fn from(agent: Agent) -> Self {
        Arc::new(agent)
    }
}
