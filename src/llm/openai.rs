//! OpenAI chat-completions client

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, instrument};

use super::{ChatMessage, TextCompletion, TextGenerator, TokenUsage, error_body, http_client};
use crate::config::TextModelConfig;
use crate::{EscapadasError, Result};

const SERVICE: &str = "OpenAI";

pub struct OpenAiClient {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    /// Build a client from config, falling back to `OPENAI_API_KEY`
    pub fn new(config: &TextModelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                EscapadasError::config(
                    "OPENAI_API_KEY environment variable not set and text_model.api_key missing",
                )
            })?;

        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &TextModelConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_seconds, config.max_retries)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    fn name(&self) -> &str {
        SERVICE
    }

    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<TextCompletion> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature,
        };

        debug!("Sending chat completion request to {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to OpenAI API");
                EscapadasError::external(SERVICE, format!("Network error: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            error!(status = %status, error = %body, "OpenAI API returned error status");
            return Err(EscapadasError::external(
                SERVICE,
                format!("API error ({status}): {body}"),
            ));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse OpenAI API response");
            EscapadasError::external(SERVICE, format!("Malformed response: {e}"))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| EscapadasError::external(SERVICE, "No content in API response"))?;

        debug!(
            chars = content.len(),
            usage = ?parsed.usage,
            "Chat completion received"
        );

        Ok(TextCompletion {
            content,
            usage: parsed.usage,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
