//! Runner, the agent execution engine.
//!
//! The [`Runner`] drives an [`Agent`] through its reasoning loop:
//!
//! 1. Build messages from instructions, history and the user input
//! 2. Call the model with the available tools and delegates
//! 3. Execute requested calls, including delegate sub-runs
//! 4. Append results and loop back to step 2
//!
//! The loop ends when the model produces text, an error occurs, or the step
//! limit is exceeded. Delegates run with their own model and a fresh
//! conversation.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::message::{ChatMessage, ToolCall};
use crate::providers::{GenerateOptions, ModelResponse, TokenUsage, ToolChoice};
use crate::tool::{BoxedTool, ToolCallResult, ToolDefinition, ToolError};

use super::config::Agent;
use super::delegate::Delegate;
use super::result::{AgentResponse, RunConfig, ToolCallRecord};

/// What the model asked for in one step.
enum NextStep {
    FinalOutput { text: String },
    ToolCalls { calls: Vec<ToolCall> },
}

/// Stateless execution engine.
///
/// All per-run state lives inside [`Runner::run`], so the same agent can be
/// run concurrently with different inputs.
#[derive(Debug, Clone, Copy)]
pub struct Runner;

impl Runner {
    /// Execute an agent run to completion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Agent`] if the agent has no provider,
    /// [`Error::MaxSteps`] if the step limit is exceeded, or propagates
    /// model errors. Failing tools and delegates do not abort the run; their
    /// errors are reported back to the model.
    pub fn run<'a>(
        agent: &'a Agent,
        input: &'a str,
        config: RunConfig,
    ) -> Pin<Box<dyn Future<Output = Result<AgentResponse>> + Send + 'a>> {
        Box::pin(Self::run_inner(agent, input, config))
    }

    async fn run_inner(agent: &Agent, input: &str, config: RunConfig) -> Result<AgentResponse> {
        let provider = agent.provider.as_deref().ok_or_else(|| {
            Error::agent(format!(
                "Agent '{}' has no provider configured. Call .provider() before running.",
                agent.name
            ))
        })?;
        let max_steps = config.max_steps.unwrap_or(agent.max_steps);

        let mut messages = Vec::with_capacity(config.history.len() + 2);
        if !agent.instructions.is_empty() {
            messages.push(ChatMessage::system(&agent.instructions));
        }
        messages.extend(config.history);
        messages.push(ChatMessage::user(input));

        let definitions = agent.callable_definitions();
        let mut usage = TokenUsage::default();
        let mut records = Vec::new();

        for step in 1..=max_steps {
            debug!(agent = %agent.name, step, "Starting step");

            let response = provider
                .generate(messages.clone(), Self::build_options(&definitions))
                .await?;
            if let Some(step_usage) = response.token_usage {
                usage += step_usage;
            }

            match Self::classify_response(&response) {
                NextStep::FinalOutput { text } => {
                    debug!(agent = %agent.name, step, "Final output");
                    return Ok(AgentResponse {
                        text,
                        agent_name: agent.name.clone(),
                        steps: step,
                        usage,
                        tool_calls: records,
                    });
                }
                NextStep::ToolCalls { calls } => {
                    messages.push(response.message);
                    let step_records = Self::execute_tool_calls(&calls, agent).await;
                    for record in &step_records {
                        messages.push(ChatMessage::tool(&record.id, &record.result));
                    }
                    records.extend(step_records);
                }
            }
        }

        warn!(agent = %agent.name, max_steps, "Step limit reached");
        Err(Error::max_steps(max_steps))
    }

    fn build_options(definitions: &[ToolDefinition]) -> GenerateOptions {
        let options = GenerateOptions::new();
        if definitions.is_empty() {
            options
        } else {
            options
                .with_tools(definitions.to_vec())
                .with_tool_choice(ToolChoice::Auto)
        }
    }

    fn classify_response(response: &ModelResponse) -> NextStep {
        match response.tool_calls() {
            Some(calls) if !calls.is_empty() => NextStep::ToolCalls {
                calls: calls.to_vec(),
            },
            _ => NextStep::FinalOutput {
                text: response.text().unwrap_or_default().to_string(),
            },
        }
    }

    /// Execute all calls of one step concurrently, keeping call order.
    async fn execute_tool_calls(calls: &[ToolCall], agent: &Agent) -> Vec<ToolCallRecord> {
        let futs = calls.iter().map(|call| Self::execute_single_tool(call, agent));
        futures::future::join_all(futs).await
    }

    async fn execute_single_tool(call: &ToolCall, agent: &Agent) -> ToolCallRecord {
        let name = call.function.name.as_str();
        let parsed = call.parsed_arguments();
        let arguments = parsed.as_ref().cloned().unwrap_or(Value::Null);

        let (result, success) = match parsed {
            Err(e) => {
                warn!(tool = %name, error = %e, "Malformed tool arguments");
                let failed = ToolCallResult {
                    id: call.id.clone(),
                    name: name.to_string(),
                    result: Err(ToolError::from(e)),
                };
                (failed.to_string_for_llm(), false)
            }
            Ok(args) => {
                if let Some(delegate) = agent.delegates.get(name) {
                    Self::dispatch_delegate(delegate.as_ref(), &args).await
                } else if let Some(tool) = agent.find_tool(name) {
                    Self::dispatch_tool(tool, call, args).await
                } else {
                    warn!(tool = %name, "Tool not found");
                    (format!("Tool '{name}' not found"), false)
                }
            }
        };

        ToolCallRecord {
            id: call.id.clone(),
            name: name.to_string(),
            arguments,
            result,
            success,
        }
    }

    async fn dispatch_delegate(delegate: &dyn Delegate, args: &Value) -> (String, bool) {
        let task = args.get("task").and_then(Value::as_str).unwrap_or_default();
        if task.trim().is_empty() {
            return (
                format!("Delegate '{}' needs a non-empty 'task'", delegate.name()),
                false,
            );
        }

        debug!(delegate = %delegate.name(), "Delegating task");
        match delegate.invoke(task).await {
            Ok(response) => (response.text, true),
            Err(e) => {
                warn!(delegate = %delegate.name(), error = %e, "Delegate failed");
                (format!("Delegate '{}' failed: {e}", delegate.name()), false)
            }
        }
    }

    async fn dispatch_tool(tool: &BoxedTool, call: &ToolCall, args: Value) -> (String, bool) {
        let record = ToolCallResult {
            id: call.id.clone(),
            name: call.function.name.clone(),
            result: tool.call_json(args).await,
        };
        (record.to_string_for_llm(), record.is_success())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::message::MessageRole;
    use crate::providers::MockModel;
    use crate::tool::DynTool;

    struct Shout;

    #[async_trait]
    impl DynTool for Shout {
        fn name(&self) -> &str {
            "shout"
        }

        fn description(&self) -> String {
            "Upper-cases text".to_string()
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(
                "shout",
                self.description(),
                json!({
                    "type": "object",
                    "properties": {"text": {"type": "string"}},
                    "required": ["text"]
                }),
            )
        }

        async fn call_json(&self, args: Value) -> std::result::Result<Value, ToolError> {
            args.get("text")
                .and_then(Value::as_str)
                .map(|t| Value::String(t.to_uppercase()))
                .ok_or_else(|| ToolError::invalid_args("missing 'text'"))
        }
    }

    #[tokio::test]
    async fn test_text_answer_in_one_step() {
        let model = Arc::new(MockModel::new().with_text("hi there"));
        let agent = Agent::new("a").instructions("sys").provider(model.clone());

        let history = vec![ChatMessage::user("earlier"), ChatMessage::assistant("ok")];
        let response = Runner::run(&agent, "hello", RunConfig::new().with_history(history))
            .await
            .unwrap();

        assert_eq!(response.text, "hi there");
        assert_eq!(response.steps, 1);
        assert_eq!(response.agent_name, "a");

        let sent = &model.requests()[0].messages;
        let roles: Vec<_> = sent.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User
            ]
        );
        assert_eq!(sent[3].text_content(), Some("hello"));
    }

    #[tokio::test]
    async fn test_tool_result_fed_back() {
        let model = Arc::new(
            MockModel::new()
                .with_tool_call("call_1", "shout", &json!({"text": "quiet"}))
                .with_text("done"),
        );
        let agent = Agent::new("a").provider(model.clone()).tool(Shout);

        let response = Runner::run(&agent, "go", RunConfig::default()).await.unwrap();

        assert_eq!(response.text, "done");
        assert_eq!(response.steps, 2);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].result, "QUIET");
        assert!(response.tool_calls[0].success);

        let requests = model.requests();
        assert_eq!(requests[0].tool_names, vec!["shout"]);
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.role, MessageRole::Tool);
        assert_eq!(last.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(last.text_content(), Some("QUIET"));
    }

    #[tokio::test]
    async fn test_unknown_and_failing_tools_do_not_abort() {
        let model = Arc::new(
            MockModel::new()
                .with_tool_calls(vec![
                    ToolCall::new("c1", "missing", &json!({})),
                    ToolCall::new("c2", "shout", &json!({})),
                ])
                .with_text("recovered"),
        );
        let agent = Agent::new("a").provider(model).tool(Shout);

        let response = Runner::run(&agent, "go", RunConfig::default()).await.unwrap();

        assert_eq!(response.text, "recovered");
        let records = &response.tool_calls;
        assert_eq!(records[0].id, "c1");
        assert_eq!(records[0].result, "Tool 'missing' not found");
        assert!(!records[0].success);
        assert_eq!(records[1].id, "c2");
        assert!(records[1].result.starts_with("Error calling tool 'shout'"));
    }

    #[tokio::test]
    async fn test_delegation_runs_sub_agent() {
        let sub_model = Arc::new(MockModel::new().with_text("You have a meeting at 10."));
        let sub = Arc::new(
            Agent::new("calendar")
                .instructions("calendar sys")
                .provider(sub_model.clone()),
        );

        let main_model = Arc::new(
            MockModel::new()
                .with_tool_call("d1", "calendar", &json!({"task": "what's today?"}))
                .with_text("Your meeting is at 10."),
        );
        let main = Agent::new("main").provider(main_model.clone()).can_call(sub);

        let response = Runner::run(&main, "schedule?", RunConfig::default())
            .await
            .unwrap();

        assert_eq!(response.text, "Your meeting is at 10.");
        assert_eq!(response.tool_calls[0].result, "You have a meeting at 10.");

        let sub_request = &sub_model.requests()[0].messages;
        assert_eq!(sub_request.len(), 2);
        assert_eq!(sub_request[1].text_content(), Some("what's today?"));
        assert_eq!(main_model.requests()[0].tool_names, vec!["calendar"]);
    }

    #[tokio::test]
    async fn test_failing_delegate_reported_to_model() {
        let sub = Arc::new(Agent::new("calendar").provider(Arc::new(MockModel::new())));
        let main_model = Arc::new(
            MockModel::new()
                .with_tool_call("d1", "calendar", &json!({"task": "today"}))
                .with_text("Sorry, the calendar is unavailable."),
        );
        let main = Agent::new("main").provider(main_model).can_call(sub);

        let response = Runner::run(&main, "schedule?", RunConfig::default())
            .await
            .unwrap();

        assert!(!response.tool_calls[0].success);
        assert!(
            response.tool_calls[0]
                .result
                .starts_with("Delegate 'calendar' failed")
        );
    }

    #[tokio::test]
    async fn test_max_steps_exceeded() {
        let model = Arc::new(
            MockModel::new()
                .with_tool_call("c1", "shout", &json!({"text": "a"}))
                .with_tool_call("c2", "shout", &json!({"text": "b"})),
        );
        let agent = Agent::new("a").provider(model).tool(Shout).max_steps(2);

        let err = Runner::run(&agent, "loop", RunConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MaxSteps { max_steps: 2 }));
    }

    #[tokio::test]
    async fn test_missing_provider() {
        let agent = Agent::new("lonely");
        let err = Runner::run(&agent, "hi", RunConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Agent(_)));
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let model = Arc::new(
            MockModel::new().with_error(crate::LlmError::rate_limited("mock")),
        );
        let agent = Agent::new("a").provider(model);
        let err = Runner::run(&agent, "hi", RunConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
    }
}
