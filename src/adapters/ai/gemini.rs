//! Gemini provider - implementation of `AiProvider` for Google's Gemini API.
//!
//! Streams chat completions over SSE (`streamGenerateContent?alt=sse`) and
//! uses `responseMimeType: application/json` for structured visualization
//! calls so the model is constrained to emit JSON.

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;

use crate::ports::{AiError, AiProvider, CompletionRequest, MessageRole, StreamChunk};

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model for chat turns.
    pub chat_model: String,
    /// Smaller model for structured visualization calls.
    pub structured_model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Creates a configuration with the given API key and default models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            chat_model: "learnlm-1.5-pro-experimental".to_string(),
            structured_model: "gemini-1.5-flash-8b".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the chat model.
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    /// Sets the structured-output model.
    pub fn with_structured_model(mut self, model: impl Into<String>) -> Self {
        self.structured_model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Gemini API provider implementation.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    /// Creates a provider with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::Connection(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, model
        )
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url, self.config.chat_model
        )
    }

    /// Converts our request into Gemini's wire format.
    fn to_gemini_request(&self, request: &CompletionRequest) -> GeminiRequest {
        let mut contents = Vec::new();
        for msg in &request.messages {
            let role = match msg.role {
                // System text travels in system_instruction, not contents.
                MessageRole::System => continue,
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };
            contents.push(Content {
                role: role.to_string(),
                parts: vec![Part {
                    text: msg.content.clone(),
                }],
            });
        }

        GeminiRequest {
            contents,
            system_instruction: request.system_prompt.as_ref().map(|text| {
                SystemInstruction {
                    parts: vec![Part { text: text.clone() }],
                }
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                response_mime_type: None,
            },
        }
    }

    async fn send(&self, url: &str, body: &GeminiRequest) -> Result<Response, AiError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.config.api_key())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    AiError::Connection(e.to_string())
                } else {
                    AiError::Api(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::TOO_MANY_REQUESTS => Err(AiError::RateLimited),
            s if s.is_server_error() => {
                Err(AiError::Connection(format!("server error {s}: {body}")))
            }
            s => Err(AiError::Api(format!("unexpected status {s}: {body}"))),
        }
    }

    async fn parse_response(&self, response: Response) -> Result<String, AiError> {
        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AiError::Malformed(format!("failed to parse response: {e}")))?;
        parsed
            .first_text()
            .ok_or_else(|| AiError::Malformed("response carried no candidate text".to_string()))
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, AiError> {
        let body = self.to_gemini_request(&request);
        let url = self.generate_url(&self.config.chat_model);
        let response = self.send(&url, &body).await?;
        self.parse_response(response).await
    }

    async fn stream_complete(
        &self,
        request: CompletionRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamChunk, AiError>> + Send>>, AiError> {
        let body = self.to_gemini_request(&request);
        let response = self.send(&self.stream_url(), &body).await?;

        // Network chunks can cut a `data:` line in half, so incomplete tail
        // bytes are carried over to the next chunk instead of being parsed.
        let stream = response
            .bytes_stream()
            .scan(String::new(), |carry, chunk_result| {
                let results = match chunk_result {
                    Ok(bytes) => {
                        carry.push_str(&String::from_utf8_lossy(&bytes));
                        drain_complete_lines(carry)
                    }
                    Err(e) => vec![Err(AiError::Connection(format!("stream error: {e}")))],
                };
                std::future::ready(Some(results))
            })
            .flat_map(stream::iter);

        Ok(Box::pin(stream))
    }

    async fn complete_structured(&self, prompt: String) -> Result<String, AiError> {
        let body = GeminiRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: None,
            generation_config: GenerationConfig {
                temperature: Some(0.2),
                max_output_tokens: None,
                response_mime_type: Some("application/json".to_string()),
            },
        };
        let url = self.generate_url(&self.config.structured_model);
        let response = self.send(&url, &body).await?;
        self.parse_response(response).await
    }
}

/// Parses the complete lines accumulated in `carry`, leaving any trailing
/// partial line in place for the next chunk.
fn drain_complete_lines(carry: &mut String) -> Vec<Result<StreamChunk, AiError>> {
    let Some(last_newline) = carry.rfind('\n') else {
        return Vec::new();
    };
    let complete: String = carry.drain(..=last_newline).collect();
    parse_gemini_sse(&complete)
}

/// Parses Gemini's SSE format into stream chunks.
///
/// Each frame is a `data: {...}` line holding one `GenerateContentResponse`
/// with the incremental candidate text.
fn parse_gemini_sse(text: &str) -> Vec<Result<StreamChunk, AiError>> {
    let mut results = Vec::new();

    for line in text.lines() {
        let Some(data) = line.strip_prefix("data: ") else {
            continue;
        };
        if data.trim() == "[DONE]" {
            continue;
        }
        if let Ok(parsed) = serde_json::from_str::<GeminiResponse>(data) {
            let finish_reason = parsed.first_finish_reason();
            if let Some(delta) = parsed.first_text() {
                if !delta.is_empty() {
                    results.push(Ok(match finish_reason {
                        Some(reason) => StreamChunk::finished(delta, reason),
                        None => StreamChunk::delta(delta),
                    }));
                    continue;
                }
            }
            if let Some(reason) = finish_reason {
                results.push(Ok(StreamChunk::finished("", reason)));
            }
        }
    }

    results
}

// ── Wire types ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GeminiResponse {
    fn first_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("");
        Some(text)
    }

    fn first_finish_reason(&self) -> Option<String> {
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.clone())
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}
