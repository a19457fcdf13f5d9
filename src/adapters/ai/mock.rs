//! Mock AI provider for tests.
//!
//! Scripted responses plus call capture, so orchestration tests can run
//! without a network and assert on the prompts that were sent.

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use crate::ports::{AiError, AiProvider, CompletionRequest, StreamChunk};

/// Configurable mock implementation of the `AiProvider` port.
#[derive(Debug, Clone, Default)]
pub struct MockAiProvider {
    /// Chunks yielded by `stream_complete`, in order.
    chunks: Vec<String>,
    /// Response for `complete`.
    completion: String,
    /// Response for `complete_structured`.
    structured: String,
    /// When set, every call fails.
    fail: bool,
    /// Captured requests, for verification.
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    /// Captured structured prompts.
    structured_prompts: Arc<Mutex<Vec<String>>>,
}

impl MockAiProvider {
    /// Creates a mock that returns empty responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Sets the chunks `stream_complete` yields.
    pub fn with_chunks<I, S>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chunks = chunks.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the `complete` response.
    pub fn with_completion(mut self, content: impl Into<String>) -> Self {
        self.completion = content.into();
        self
    }

    /// Sets the `complete_structured` response.
    pub fn with_structured(mut self, content: impl Into<String>) -> Self {
        self.structured = content.into();
        self
    }

    /// All completion requests seen so far, in call order.
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// All structured prompts seen so far.
    pub fn recorded_structured_prompts(&self) -> Vec<String> {
        self.structured_prompts.lock().unwrap().clone()
    }

    fn record(&self, request: CompletionRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, AiError> {
        self.record(request);
        if self.fail {
            return Err(AiError::Api("mock failure".to_string()));
        }
        Ok(self.completion.clone())
    }

    async fn stream_complete(
        &self,
        request: CompletionRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamChunk, AiError>> + Send>>, AiError> {
        self.record(request);
        if self.fail {
            return Err(AiError::Api("mock failure".to_string()));
        }

        let deltas: Vec<Result<StreamChunk, AiError>> = self
            .chunks
            .iter()
            .map(|c| Ok(StreamChunk::delta(c.clone())))
            .collect();
        let terminator = stream::once(async { Ok(StreamChunk::finished("", "stop")) });
        Ok(Box::pin(stream::iter(deltas).chain(terminator)))
    }

    async fn complete_structured(&self, prompt: String) -> Result<String, AiError> {
        self.structured_prompts.lock().unwrap().push(prompt);
        if self.fail {
            return Err(AiError::Api("mock failure".to_string()));
        }
        Ok(self.structured.clone())
    }
}
