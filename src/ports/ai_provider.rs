//! AI provider port - interface for LLM integrations.
//!
//! Abstracts the model behind three call shapes: a streaming completion for
//! chat turns, a plain completion when the whole response is needed at once,
//! and a structured completion that is expected to return JSON.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use thiserror::Error;

use crate::domain::{Role, Turn};

/// Port for AI/LLM provider interactions.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generates a complete response in one call.
    async fn complete(&self, request: CompletionRequest) -> Result<String, AiError>;

    /// Generates a streaming response; chunks arrive as the model emits them.
    async fn stream_complete(
        &self,
        request: CompletionRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamChunk, AiError>> + Send>>, AiError>;

    /// Generates a response that is expected to be JSON (e.g. a visualization
    /// payload). Returns the raw text; the caller parses and validates.
    async fn complete_structured(&self, prompt: String) -> Result<String, AiError>;
}

/// Request for a chat completion.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// System prompt guiding model behavior.
    pub system_prompt: Option<String>,
    /// Conversation messages (history + current user message).
    pub messages: Vec<Message>,
    /// Temperature for response randomness.
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Appends a message.
    pub fn with_message(mut self, role: MessageRole, content: impl Into<String>) -> Self {
        self.messages.push(Message::new(role, content));
        self
    }

    /// Appends prior session turns as context messages.
    pub fn with_history(mut self, turns: &[Turn]) -> Self {
        for turn in turns {
            let role = match turn.role {
                Role::User => MessageRole::User,
                Role::Bot => MessageRole::Assistant,
            };
            self.messages.push(Message::new(role, turn.content.clone()));
        }
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the token cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message.
    pub role: MessageRole,
    /// Message content.
    pub content: String,
}

impl Message {
    /// Creates a new message.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions.
    System,
    /// User input.
    User,
    /// Model response.
    Assistant,
}

/// One incremental fragment of a streaming response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    /// The delta content in this chunk.
    pub delta: String,
    /// Set on the final chunk.
    pub finish_reason: Option<String>,
}

impl StreamChunk {
    /// Creates an intermediate chunk.
    pub fn delta(content: impl Into<String>) -> Self {
        Self {
            delta: content.into(),
            finish_reason: None,
        }
    }

    /// Creates a final chunk.
    pub fn finished(content: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            delta: content.into(),
            finish_reason: Some(reason.into()),
        }
    }
}

/// Error from an AI provider.
#[derive(Debug, Clone, Error)]
pub enum AiError {
    #[error("rate limited")]
    RateLimited,

    #[error("API error: {0}")]
    Api(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}
