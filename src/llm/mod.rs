//! Hosted model collaborators
//!
//! The pipeline only talks to the [`TextGenerator`] and [`ImageGenerator`]
//! traits; the OpenAI and Gemini clients are the production implementations.

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::{EscapadasError, Result};

pub mod gemini;
pub mod json;
pub mod openai;

pub use gemini::GeminiImageClient;
pub use json::{Parsed, parse_or_default};
pub use openai::OpenAiClient;

/// A role-tagged chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Token counts reported by the text collaborator for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Text returned by one completion call
#[derive(Debug, Clone, PartialEq)]
pub struct TextCompletion {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

/// Result of an image request that reached the service
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    Image { bytes: Vec<u8>, mime_type: String },
    /// The service answered but sent no image; `diagnostic` says what it sent instead
    NoImage { diagnostic: String },
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable collaborator name used in warnings
    fn name(&self) -> &str;

    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<TextCompletion>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate_image(&self, prompt: &str) -> Result<ImageOutcome>;
}

/// Image collaborator that may be unusable, e.g. when its API key is missing.
/// An unavailable client answers every request with [`ImageOutcome::NoImage`]
/// so only the image stages degrade.
pub enum ImageClient<I> {
    Ready(I),
    Unavailable { service: &'static str, reason: String },
}

impl<I: ImageGenerator> ImageClient<I> {
    pub fn from_result(service: &'static str, client: Result<I>) -> Self {
        match client {
            Ok(client) => Self::Ready(client),
            Err(e) => {
                warn!(service, error = %e, "Image generation disabled");
                Self::Unavailable {
                    service,
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

#[async_trait]
impl<I: ImageGenerator> ImageGenerator for ImageClient<I> {
    fn name(&self) -> &str {
        match self {
            Self::Ready(client) => client.name(),
            Self::Unavailable { service, .. } => *service,
        }
    }

    async fn generate_image(&self, prompt: &str) -> Result<ImageOutcome> {
        match self {
            Self::Ready(client) => client.generate_image(prompt).await,
            Self::Unavailable { reason, .. } => Ok(ImageOutcome::NoImage {
                diagnostic: reason.clone(),
            }),
        }
    }
}

/// HTTP client with timeout and transient-failure retries
pub(crate) fn http_client(timeout_seconds: u32, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(concat!("escapadas/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| EscapadasError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Body of a failed response, shortened for logs and warnings
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    text.chars().take(500).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unreachable;

    #[async_trait]
    impl ImageGenerator for Unreachable {
        fn name(&self) -> &str {
            "Unreachable"
        }

        async fn generate_image(&self, _prompt: &str) -> Result<ImageOutcome> {
            Err(EscapadasError::external("Unreachable", "must not be called"))
        }
    }

    #[tokio::test]
    async fn test_unavailable_image_client_reports_no_image() {
        let client: ImageClient<Unreachable> = ImageClient::from_result(
            "Gemini",
            Err(EscapadasError::config("GOOGLE_API_KEY environment variable not set")),
        );
        assert!(!client.is_ready());
        assert_eq!(client.name(), "Gemini");

        let outcome = client.generate_image("Mapa turístico").await.unwrap();
        match outcome {
            ImageOutcome::NoImage { diagnostic } => assert!(diagnostic.contains("GOOGLE_API_KEY")),
            other => panic!("expected no image, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ready_image_client_delegates() {
        let client = ImageClient::from_result("Unreachable", Ok(Unreachable));
        assert!(client.is_ready());
        assert!(client.generate_image("Flyer").await.is_err());
    }
}
