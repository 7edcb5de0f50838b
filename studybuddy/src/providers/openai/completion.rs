//! `OpenAI` Chat Completions API implementation.

use super::client::OpenAIClient;
use crate::error::LlmError;
use crate::message::ChatMessage;
use crate::providers::{GenerateOptions, Model, ModelResponse, TokenUsage};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

/// `gpt-4o-mini`, the default chat model.
pub const GPT_4O_MINI: &str = "gpt-4o-mini";

const PROVIDER: &str = "openai";

/// `OpenAI` Chat Completion model.
#[derive(Clone)]
pub struct CompletionModel {
    client: OpenAIClient,
    model_id: String,
}

impl std::fmt::Debug for CompletionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionModel")
            .field("model_id", &self.model_id)
            .finish_non_exhaustive()
    }
}

impl CompletionModel {
    pub(crate) fn new(client: OpenAIClient, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }

    /// Build the request body for the API.
    fn build_request_body(&self, messages: &[ChatMessage], options: &GenerateOptions) -> Value {
        let mut body = json!({
            "model": self.model_id,
            "messages": messages,
        });

        if let Some(tools) = options.tools.as_ref().filter(|t| !t.is_empty()) {
            body["tools"] = tools.iter().map(|t| t.to_openai()).collect();
            if let Some(choice) = options.tool_choice {
                body["tool_choice"] = json!(choice);
            }
        }

        body
    }

    /// Map a non-success status to a typed error.
    fn status_error(status: u16, body: String) -> LlmError {
        match status {
            401 | 403 => LlmError::auth(PROVIDER, body),
            429 => LlmError::rate_limited(PROVIDER),
            _ => LlmError::http_status(status, body).with_provider(PROVIDER),
        }
    }

    fn parse_response(response: ChatCompletionResponse) -> Result<ModelResponse, LlmError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::response_format("at least one choice", "none"))?;

        let mut model_response = ModelResponse::new(choice.message);
        if let Some(usage) = response.usage {
            model_response = model_response.with_token_usage(TokenUsage::new(
                saturating_u32(usage.prompt_tokens),
                saturating_u32(usage.completion_tokens),
            ));
        }
        Ok(model_response)
    }
}

fn saturating_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[async_trait]
impl Model for CompletionModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip_all, fields(model = %self.model_id))]
    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerateOptions,
    ) -> Result<ModelResponse, LlmError> {
        let url = format!("{}/chat/completions", self.client.base_url());
        let body = self.build_request_body(&messages, &options);
        debug!(messages = messages.len(), tools = options.has_tools(), "sending chat completion");

        let response = self
            .client
            .http_client()
            .post(&url)
            .headers(self.client.auth_headers())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status.as_u16(), text));
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        Self::parse_response(parsed)
    }
}
