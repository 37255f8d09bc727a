use async_trait::async_trait;
use clipnote_core::Settings;
use serde::Deserialize;
use serde_json::json;

use crate::endpoints::{completions_url, normalize_auth_token};
use crate::types::OrchestrationError;

/// The instruction-fulfilling model collaborator. `prompt` already has the
/// content marker substituted.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompt: &str, settings: &Settings)
        -> Result<String, OrchestrationError>;
}

/// Chat-completions client for OpenAI-compatible model endpoints.
#[derive(Debug, Clone, Default)]
pub struct ChatModelClient {
    client: reqwest::Client,
}

impl ChatModelClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Deserialize)]
struct CompletionBody {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

#[async_trait]
impl Summarizer for ChatModelClient {
    async fn summarize(
        &self,
        prompt: &str,
        settings: &Settings,
    ) -> Result<String, OrchestrationError> {
        let url = completions_url(&settings.model_url)?;

        let response = self
            .client
            .post(url)
            .header(
                reqwest::header::AUTHORIZATION,
                normalize_auth_token(&settings.api_key),
            )
            .json(&json!({
                "model": settings.model_name,
                "messages": [{ "role": "user", "content": prompt }],
                "temperature": settings.temperature,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Surface the endpoint's own error message when it sends one.
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.and_then(|e| e.message))
                .unwrap_or_else(|| status.to_string());
            return Err(OrchestrationError::transport(
                Some(status.as_u16()),
                format!("model request failed: {detail}"),
            ));
        }

        let body: CompletionBody = response
            .json()
            .await
            .map_err(|err| OrchestrationError::response_format(err.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| {
                OrchestrationError::response_format("completion carries no message content")
            })?;

        Ok(content.trim().to_string())
    }
}
