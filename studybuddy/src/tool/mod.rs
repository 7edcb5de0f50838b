//! Tools that agents can invoke.
//!
//! The [`DynTool`] trait is the object-safe interface the [`Runner`](crate::agent::Runner)
//! dispatches into. Each tool describes itself with a [`ToolDefinition`]
//! (name, description, JSON schema of its parameters) which is forwarded to
//! the model, and receives the model's arguments as raw JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! use studybuddy::tool::{DynTool, ToolDefinition, ToolError};
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl DynTool for Echo {
//!     fn name(&self) -> &str { "echo" }
//!     fn description(&self) -> String { "Echo the input".into() }
//!     fn definition(&self) -> ToolDefinition { /* ... */ }
//!     async fn call_json(&self, args: Value) -> Result<Value, ToolError> { Ok(args) }
//! }
//! ```

mod errors;

pub use errors::ToolError;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Description of a tool, as sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Function name the model uses to call the tool.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a definition.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Convert to the OpenAI `tools` array entry.
    #[must_use]
    pub fn to_openai(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Object-safe tool interface.
#[async_trait]
pub trait DynTool: Send + Sync {
    /// Tool name, unique within an agent.
    fn name(&self) -> &str;

    /// Tool description.
    fn description(&self) -> String;

    /// Full definition sent to the model.
    fn definition(&self) -> ToolDefinition;

    /// Invoke the tool with raw JSON arguments.
    async fn call_json(&self, args: Value) -> Result<Value, ToolError>;
}

/// Boxed tool trait object.
pub type BoxedTool = Box<dyn DynTool>;

/// Outcome of one tool invocation, ready to be fed back to the model.
#[derive(Debug)]
pub struct ToolCallResult {
    /// Tool call identifier.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Tool output or error.
    pub result: Result<Value, ToolError>,
}

impl ToolCallResult {
    /// Whether the tool succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Render the result as the content of a tool message.
    ///
    /// String outputs are passed through unquoted.
    #[must_use]
    pub fn to_string_for_llm(&self) -> String {
        match &self.result {
            Ok(Value::String(s)) => s.clone(),
            Ok(other) => other.to_string(),
            Err(e) => format!("Error calling tool '{}': {e}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_to_openai() {
        let def = ToolDefinition::new("noop", "Does nothing", json!({"type": "object"}));
        assert_eq!(
            def.to_openai(),
            json!({
                "type": "function",
                "function": {
                    "name": "noop",
                    "description": "Does nothing",
                    "parameters": {"type": "object"}
                }
            })
        );
    }

    #[test]
    fn test_call_result_formatting() {
        let ok = ToolCallResult {
            id: "1".into(),
            name: "noop".into(),
            result: Ok(Value::String("done".into())),
        };
        assert!(ok.is_success());
        assert_eq!(ok.to_string_for_llm(), "done");

        let structured = ToolCallResult {
            id: "2".into(),
            name: "noop".into(),
            result: Ok(json!({"n": 1})),
        };
        assert_eq!(structured.to_string_for_llm(), r#"{"n":1}"#);

        let failed = ToolCallResult {
            id: "3".into(),
            name: "noop".into(),
            result: Err(ToolError::invalid_args("missing field `date`")),
        };
        assert!(!failed.is_success());
        assert_eq!(
            failed.to_string_for_llm(),
            "Error calling tool 'noop': invalid arguments: missing field `date`"
        );

        let crashed = ToolCallResult {
            id: "4".into(),
            name: "noop".into(),
            result: Err(ToolError::execution("calendar backend offline")),
        };
        assert_eq!(
            crashed.to_string_for_llm(),
            "Error calling tool 'noop': execution failed: calendar backend offline"
        );
    }
}
