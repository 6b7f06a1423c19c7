//! Hosted text generation behind [`GenerationClient`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::GenerationConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Single-shot prompt completion.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[async_trait]
impl<T: GenerationClient + ?Sized> GenerationClient for std::sync::Arc<T> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation transport error: {0}")]
    Transport(String),
    #[error("generation API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("prompt rejected by safety filters: {0}")]
    Blocked(String),
    #[error("generation returned no text")]
    Empty,
    #[error("generation payload could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Client for the Gemini `generateContent` REST endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .connect_timeout(config.timeout.min(std::time::Duration::from_secs(10)))
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateContentRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let payload = response.text().await?;
        debug!(status = status.as_u16(), bytes = payload.len(), "generation response");
        parse_response(status, &payload)
    }
}

/// Stand-in used when no generation credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredClient;

#[async_trait]
impl GenerationClient for UnconfiguredClient {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Api {
            status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
            message: "text generation is not configured".to_string(),
        })
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Turn an HTTP status and body into generated text or a classified error.
pub(crate) fn parse_response(status: StatusCode, body: &str) -> Result<String, GenerationError> {
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.trim().to_string());
        return Err(GenerationError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let response: GenerateContentResponse = serde_json::from_str(body)?;

    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(GenerationError::Blocked(reason));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(GenerationError::Empty);
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_default();
        if matches!(reason.as_str(), "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST") {
            return Err(GenerationError::Blocked(reason));
        }
        return Err(GenerationError::Empty);
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn endpoint_targets_configured_model() {
        let client = GeminiClient::new(&GenerationConfig {
            api_key: "key".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            base_url: "https://generativelanguage.googleapis.com/".to_string(),
            timeout: Duration::from_secs(60),
        })
        .expect("client builds");

        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn parts_are_concatenated() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Hola "},{"text":"mundo"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(parse_response(StatusCode::OK, body).expect("text"), "Hola mundo");
    }

    #[test]
    fn blocked_prompts_mention_safety() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let error = parse_response(StatusCode::OK, body).expect_err("blocked");
        assert!(matches!(error, GenerationError::Blocked(_)));
        assert!(error.to_string().to_lowercase().contains("safety"));

        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        let error = parse_response(StatusCode::OK, body).expect_err("blocked");
        assert!(matches!(error, GenerationError::Blocked(_)));
    }

    #[test]
    fn api_errors_carry_upstream_message() {
        let body = r#"{"error":{"code":429,"message":"You exceeded your current quota.","status":"RESOURCE_EXHAUSTED"}}"#;
        match parse_response(StatusCode::TOO_MANY_REQUESTS, body) {
            Err(GenerationError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert!(message.contains("quota"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn missing_candidates_are_empty() {
        assert!(matches!(
            parse_response(StatusCode::OK, r#"{"candidates":[]}"#),
            Err(GenerationError::Empty)
        ));
        assert!(matches!(
            parse_response(StatusCode::OK, "not json"),
            Err(GenerationError::Decode(_))
        ));
    }
}
