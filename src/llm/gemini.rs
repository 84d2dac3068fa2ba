//! Gemini image generation through `generateContent`

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, instrument, warn};

use super::{ImageClient, ImageGenerator, ImageOutcome, error_body, http_client};
use crate::config::ImageModelConfig;
use crate::{EscapadasError, Result};

const SERVICE: &str = "Gemini";

pub struct GeminiImageClient {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiImageClient {
    /// Build a client from config, falling back to `GOOGLE_API_KEY`
    pub fn new(config: &ImageModelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| env::var("GOOGLE_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                EscapadasError::config(
                    "GOOGLE_API_KEY environment variable not set and image_model.api_key missing",
                )
            })?;

        Self::with_api_key(config, api_key)
    }

    /// Like [`GeminiImageClient::new`], but a missing key only disables the
    /// image stages instead of failing the run
    pub fn optional(config: &ImageModelConfig) -> ImageClient<Self> {
        ImageClient::from_result(SERVICE, Self::new(config))
    }

    pub fn with_api_key(config: &ImageModelConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_seconds, config.max_retries)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageClient {
    fn name(&self) -> &str {
        SERVICE
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate_image(&self, prompt: &str) -> Result<ImageOutcome> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to Gemini API");
                EscapadasError::external(SERVICE, format!("Network error: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            error!(status = %status, error = %body, "Gemini API returned error status");
            return Err(EscapadasError::external(
                SERVICE,
                format!("API error ({status}): {body}"),
            ));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Gemini API response");
            EscapadasError::external(SERVICE, format!("Malformed response: {e}"))
        })?;

        image_from_response(parsed)
    }
}

fn image_from_response(response: GenerateResponse) -> Result<ImageOutcome> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        warn!(reason = %reason, "Gemini returned no candidates");
        return Ok(ImageOutcome::NoImage { diagnostic: reason });
    };

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    let mut texts = Vec::new();
    for part in parts {
        if let Some(inline) = part.inline_data {
            let bytes = STANDARD.decode(inline.data.as_bytes()).map_err(|e| {
                EscapadasError::external(SERVICE, format!("Invalid inline image data: {e}"))
            })?;
            debug!(bytes = bytes.len(), mime = %inline.mime_type, "Image received");
            return Ok(ImageOutcome::Image {
                bytes,
                mime_type: inline.mime_type,
            });
        }
        if let Some(text) = part.text {
            texts.push(text);
        }
    }

    let diagnostic = if texts.is_empty() {
        candidate
            .finish_reason
            .map_or_else(|| "no inline_data".to_string(), |r| format!("no inline_data ({r})"))
    } else {
        texts.join(" ")
    };
    warn!(diagnostic = %diagnostic, "Gemini response contained no image");
    Ok(ImageOutcome::NoImage { diagnostic })
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType", alias = "mime_type", default = "default_mime")]
    mime_type: String,
    data: String,
}

fn default_mime() -> String {
    "image/png".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: String) -> ImageModelConfig {
        ImageModelConfig {
            api_key: None,
            base_url,
            model: "gemini-2.5-flash-image-preview".to_string(),
            timeout_seconds: 5,
            max_retries: 0,
        }
    }

    #[tokio::test]
    async fn test_inline_image_is_decoded() {
        let png = [0x89_u8, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        let body = format!(
            r#"{{"candidates": [{{"content": {{"parts": [
                {{"text": "Acá está tu mapa"}},
                {{"inlineData": {{"mimeType": "image/png", "data": "{}"}}}}
            ]}}, "finishReason": "STOP"}}]}}"#,
            STANDARD.encode(png)
        );

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                "/v1beta/models/gemini-2.5-flash-image-preview:generateContent",
            )
            .match_header("x-goog-api-key", "g-key")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"contents":[{"parts":[{"text":"Flyer de Bariloche"}]}]}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = GeminiImageClient::with_api_key(
            &config(format!("{}/v1beta", server.url())),
            "g-key".into(),
        )
        .unwrap();
        let outcome = client.generate_image("Flyer de Bariloche").await.unwrap();

        assert_eq!(
            outcome,
            ImageOutcome::Image {
                bytes: png.to_vec(),
                mime_type: "image/png".to_string()
            }
        );
        mock.assert_async().await;
    }

    #[test]
    fn test_text_only_answer_is_no_image() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "No puedo generar esa imagen"}]}}]}"#,
        )
        .unwrap();
        let outcome = image_from_response(response).unwrap();
        assert_eq!(
            outcome,
            ImageOutcome::NoImage {
                diagnostic: "No puedo generar esa imagen".to_string()
            }
        );
    }

    #[test]
    fn test_blocked_prompt_is_no_image() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        let outcome = image_from_response(response).unwrap();
        assert_eq!(
            outcome,
            ImageOutcome::NoImage {
                diagnostic: "SAFETY".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_server_error_is_external_service_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock(
                "POST",
                "/v1beta/models/gemini-2.5-flash-image-preview:generateContent",
            )
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let client = GeminiImageClient::with_api_key(
            &config(format!("{}/v1beta", server.url())),
            "g-key".into(),
        )
        .unwrap();
        let err = client.generate_image("Mapa").await.unwrap_err();
        assert!(matches!(err, EscapadasError::ExternalService { .. }));
    }
}
