//! Chat store port - durable persistence for sessions and turns.
//!
//! The in-memory session registry is a cache; this port owns the
//! authoritative copy. Write failures are reported but must never block the
//! user-visible response.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Intent, Role, SessionId};

/// Port for durable chat persistence.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Creates a durable session row, returning its id.
    async fn create_session(&self, owner_id: Option<&str>) -> Result<SessionId, ChatStoreError>;

    /// Appends one turn record.
    async fn append_message(&self, record: TurnRecord) -> Result<(), ChatStoreError>;

    /// Lists a session's turns in insertion order.
    async fn list_messages(&self, session_id: SessionId) -> Result<Vec<TurnRecord>, ChatStoreError>;

    /// Renames a session.
    async fn rename_session(&self, session_id: SessionId, name: &str)
        -> Result<(), ChatStoreError>;
}

/// One persisted turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Session this turn belongs to.
    pub session_id: SessionId,
    /// Who produced the turn.
    pub role: Role,
    /// Turn content (artifact-stripped for bot turns).
    pub content: String,
    /// Intent classified for the turn, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    /// Structured artifact emitted alongside the turn, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<serde_json::Value>,
    /// When the turn was recorded.
    pub created_at: DateTime<Utc>,
}

impl TurnRecord {
    /// Creates a record stamped with the current time.
    pub fn new(session_id: SessionId, role: Role, content: impl Into<String>) -> Self {
        Self {
            session_id,
            role,
            content: content.into(),
            intent: None,
            artifact: None,
            created_at: Utc::now(),
        }
    }

    /// Attaches a classified intent.
    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = Some(intent);
        self
    }

    /// Attaches an artifact payload.
    pub fn with_artifact(mut self, artifact: serde_json::Value) -> Self {
        self.artifact = Some(artifact);
        self
    }
}

/// Chat store failure.
#[derive(Debug, Clone, Error)]
pub enum ChatStoreError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_builder_attaches_fields() {
        let record = TurnRecord::new(SessionId::new(), Role::User, "hi")
            .with_intent(Intent::General)
            .with_artifact(serde_json::json!({"visualizationType": "array"}));
        assert_eq!(record.intent, Some(Intent::General));
        assert!(record.artifact.is_some());
    }

    #[test]
    fn optional_fields_skipped_in_json() {
        let record = TurnRecord::new(SessionId::new(), Role::Bot, "reply");
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("intent"));
        assert!(!json.contains("artifact"));
    }
}
