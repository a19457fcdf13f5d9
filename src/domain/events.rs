//! Output events emitted while handling one turn.
//!
//! The orchestrator produces an ordered sequence of these per turn; the HTTP
//! layer relays each as one SSE frame and the orchestrator accumulates them
//! to build the persisted turn record.

use serde::{Deserialize, Serialize};

/// One event in a turn's output stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    /// A fragment of the assistant's text response.
    Text { content: String },
    /// A structured visualization payload, emitted at most once per turn.
    Artifact { payload: serde_json::Value },
    /// A user-facing error. Terminal for the turn that emits it.
    Error { message: String },
}

impl OutputEvent {
    /// Creates a text fragment event.
    pub fn text(content: impl Into<String>) -> Self {
        OutputEvent::Text {
            content: content.into(),
        }
    }

    /// Creates an artifact event.
    pub fn artifact(payload: serde_json::Value) -> Self {
        OutputEvent::Artifact { payload }
    }

    /// Creates an error event.
    pub fn error(message: impl Into<String>) -> Self {
        OutputEvent::Error {
            message: message.into(),
        }
    }

    /// SSE event name for this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            OutputEvent::Text { .. } => "text",
            OutputEvent::Artifact { .. } => "artifact",
            OutputEvent::Error { .. } => "error",
        }
    }
}
