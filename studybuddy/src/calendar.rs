//! Mocked calendar tools and the calendar sub-agent.
//!
//! Both tools return fixed text and keep no state. They exist so the main
//! agent has something concrete to delegate to.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::agent::Agent;
use crate::providers::SharedModel;
use crate::tool::{DynTool, ToolDefinition, ToolError};

/// Name of the calendar sub-agent.
pub const CALENDAR_AGENT_NAME: &str = "calendar-assistant";

/// Instructions of the calendar sub-agent.
pub const CALENDAR_INSTRUCTIONS: &str =
    "You are a assistant that knows the user's calendar and can help them manage their schedule.";

const DEFAULT_DATE: &str = "today";

/// Events scheduled on `date`.
#[must_use]
pub fn get_calendar_events(date: &str) -> String {
    format!("Events on {date}: Meeting with Bob at 10 AM, Lunch with Alice at 1 PM.")
}

/// Add an event and confirm it.
#[must_use]
pub fn add_calendar_event(date: &str, time: &str, event: &str) -> String {
    format!("Added event '{event}' on {date} at {time}.")
}

#[derive(Debug, Deserialize)]
struct GetEventsArgs {
    #[serde(default = "default_date")]
    date: String,
}

fn default_date() -> String {
    DEFAULT_DATE.to_string()
}

#[derive(Debug, Deserialize)]
struct AddEventArgs {
    date: String,
    time: String,
    event: String,
}

/// Tool wrapper around [`get_calendar_events`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GetCalendarEvents;

#[async_trait]
impl DynTool for GetCalendarEvents {
    fn name(&self) -> &str {
        "get_calendar_events"
    }

    fn description(&self) -> String {
        "Get the calendar events for a date.".to_string()
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            self.name(),
            self.description(),
            json!({
                "type": "object",
                "properties": {
                    "date": {
                        "type": "string",
                        "description": "Date to look up, e.g. 2024-01-01. Defaults to today."
                    }
                }
            }),
        )
    }

    async fn call_json(&self, args: Value) -> Result<Value, ToolError> {
        // Models sometimes send `null` instead of `{}` for no arguments.
        let args: GetEventsArgs = if args.is_null() {
            GetEventsArgs {
                date: default_date(),
            }
        } else {
            serde_json::from_value(args)?
        };
        Ok(Value::String(get_calendar_events(&args.date)))
    }
}

/// Tool wrapper around [`add_calendar_event`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AddCalendarEvent;

#[async_trait]
impl DynTool for AddCalendarEvent {
    fn name(&self) -> &str {
        "add_calendar_event"
    }

    fn description(&self) -> String {
        "Add an event to the calendar.".to_string()
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            self.name(),
            self.description(),
            json!({
                "type": "object",
                "properties": {
                    "date": {"type": "string", "description": "Date of the event."},
                    "time": {"type": "string", "description": "Start time of the event."},
                    "event": {"type": "string", "description": "Title of the event."}
                },
                "required": ["date", "time", "event"]
            }),
        )
    }

    async fn call_json(&self, args: Value) -> Result<Value, ToolError> {
        let args: AddEventArgs = serde_json::from_value(args)?;
        Ok(Value::String(add_calendar_event(
            &args.date,
            &args.time,
            &args.event,
        )))
    }
}

/// Build the calendar sub-agent on top of `model`.
#[must_use]
pub fn calendar_agent(model: SharedModel) -> Agent {
    Agent::new(CALENDAR_AGENT_NAME)
        .description("Knows the user's calendar. Can list the events of a date and add new events.")
        .instructions(CALENDAR_INSTRUCTIONS)
        .provider(model)
        .tool(GetCalendarEvents)
        .tool(AddCalendarEvent)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::agent::{RunConfig, Runner};
    use crate::providers::MockModel;

    #[test]
    fn test_mock_strings() {
        assert_eq!(
            get_calendar_events("2024-01-01"),
            "Events on 2024-01-01: Meeting with Bob at 10 AM, Lunch with Alice at 1 PM."
        );
        assert_eq!(
            add_calendar_event("2024-01-01", "10:00", "Standup"),
            "Added event 'Standup' on 2024-01-01 at 10:00."
        );
    }

    #[tokio::test]
    async fn test_get_events_defaults_to_today() {
        let out = GetCalendarEvents.call_json(json!({})).await.unwrap();
        assert_eq!(
            out,
            "Events on today: Meeting with Bob at 10 AM, Lunch with Alice at 1 PM."
        );
        let out = GetCalendarEvents.call_json(Value::Null).await.unwrap();
        assert!(out.as_str().unwrap().starts_with("Events on today"));
    }

    #[tokio::test]
    async fn test_add_event_requires_all_fields() {
        let err = AddCalendarEvent
            .call_json(json!({"date": "2024-01-01"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));

        let ok = AddCalendarEvent
            .call_json(json!({"date": "2024-01-01", "time": "10:00", "event": "Standup"}))
            .await
            .unwrap();
        assert_eq!(ok, "Added event 'Standup' on 2024-01-01 at 10:00.");
    }

    #[tokio::test]
    async fn test_calendar_agent_uses_tools() {
        let model = Arc::new(
            MockModel::new()
                .with_tool_call("c1", "get_calendar_events", &json!({"date": "2024-01-01"}))
                .with_text("Bob at 10, Alice at 1."),
        );
        let agent = calendar_agent(model.clone());

        let response = Runner::run(&agent, "What is on 2024-01-01?", RunConfig::default())
            .await
            .unwrap();

        assert_eq!(response.agent_name, CALENDAR_AGENT_NAME);
        assert_eq!(response.text, "Bob at 10, Alice at 1.");
        assert_eq!(
            response.tool_calls[0].result,
            get_calendar_events("2024-01-01")
        );

        let first = &model.requests()[0];
        assert_eq!(
            first.tool_names,
            vec!["get_calendar_events", "add_calendar_event"]
        );
        assert_eq!(
            first.messages[0].text_content(),
            Some(CALENDAR_INSTRUCTIONS)
        );
    }
}
