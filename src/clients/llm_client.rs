//! LLM (chat completion) API client module
//!
//! Encapsulates the model call that turns one issue timeline into a
//! one-sentence summary.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

use super::Summarizer;
use crate::core::config::AppConfig;
use crate::errors::DigestError;
use crate::prompt::{SYSTEM_PROMPT, build_user_prompt};

pub const REQUEST_TIMEOUT_SECS: u64 = 30;
const TEMPERATURE: f64 = 1.0;
const TOP_P: f64 = 1.0;
const MAX_TOKENS: u32 = 1000;

#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}

/// LLM API client for generating timeline summaries
pub struct LlmClient {
    http: Client,
    api_key: String,
    endpoint: String,
    model_name: String,
}

impl LlmClient {
    /// # Errors
    ///
    /// Returns `ConfigError` if the HTTP client cannot be built.
    pub fn new(
        api_key: String,
        endpoint: String,
        model_name: String,
        timeout: Duration,
    ) -> Result<Self, DigestError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DigestError::ConfigError(format!("failed to build model client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model_name,
        })
    }

    /// # Errors
    ///
    /// See [`LlmClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, DigestError> {
        Self::new(
            config.models_token.clone(),
            config.models_endpoint.clone(),
            config.models_model.clone(),
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn build_prompt(
        &self,
        serialized_timeline: &str,
        context_query: &str,
    ) -> Vec<ChatCompletionMessage> {
        vec![
            ChatCompletionMessage {
                role: MessageRole::system,
                content: Content::Text(SYSTEM_PROMPT.to_string()),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
            ChatCompletionMessage {
                role: MessageRole::user,
                content: Content::Text(build_user_prompt(serialized_timeline, context_query)),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
        ]
    }

    pub async fn generate_summary(
        &self,
        prompt: Vec<ChatCompletionMessage>,
    ) -> Result<String, DigestError> {
        #[cfg(feature = "debug-logs")]
        info!("Using model prompt:\n{:?}", prompt);

        let estimated_input_tokens = prompt
            .iter()
            .map(|msg| estimate_tokens(&format!("{:?}", msg.content)))
            .sum::<usize>();

        info!(
            "Requesting summary from {} (estimated input tokens: {})",
            self.model_name, estimated_input_tokens
        );

        let messages: Vec<Value> = prompt
            .iter()
            .map(|msg| {
                let role_str = match msg.role {
                    MessageRole::system => "system",
                    MessageRole::user => "user",
                    MessageRole::assistant => "assistant",
                    MessageRole::function => "function",
                    MessageRole::tool => "tool",
                };

                let content_val = match &msg.content {
                    Content::Text(text) => json!(text),
                    Content::ImageUrl(_) => json!(""),
                };

                json!({
                    "role": role_str,
                    "content": content_val
                })
            })
            .collect();

        let request_body = json!({
            "model": self.model_name,
            "messages": messages,
            "temperature": TEMPERATURE,
            "top_p": TOP_P,
            "max_tokens": MAX_TOKENS
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DigestError::SummarizationError(format!("model request timed out: {e}"))
                } else {
                    DigestError::SummarizationError(format!("model request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DigestError::SummarizationError(format!(
                "model API error ({}): {}",
                status.as_u16(),
                error_text
            )));
        }

        let response_json: Value = response.json().await.map_err(|e| {
            DigestError::SummarizationError(format!("Failed to parse model response: {e}"))
        })?;

        completion_text(&response_json)
    }
}

/// Extracts the first choice's content; a null or missing content is an
/// empty summary, a missing choice is an error.
///
/// # Errors
///
/// Returns `SummarizationError` when the response has no choices.
pub fn completion_text(response_json: &Value) -> Result<String, DigestError> {
    let choice = response_json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .ok_or_else(|| DigestError::SummarizationError("No choices in response".to_string()))?;

    Ok(choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .trim()
        .to_string())
}

#[async_trait]
impl Summarizer for LlmClient {
    async fn summarize(
        &self,
        serialized_timeline: &str,
        context_query: &str,
    ) -> Result<String, DigestError> {
        let prompt = self.build_prompt(serialized_timeline, context_query);
        self.generate_summary(prompt).await
    }
}
