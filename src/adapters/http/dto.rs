//! Wire DTOs for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ports::TurnRecord;

/// POST /api/chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message for this turn.
    pub message: String,
}

/// POST /api/sessions request body.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Optional owner to associate the session with.
    #[serde(default)]
    pub owner_id: Option<String>,
}

/// POST /api/sessions response body.
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// PATCH /api/sessions/:id/rename request body.
#[derive(Debug, Deserialize)]
pub struct RenameSessionRequest {
    pub name: String,
}

/// One persisted message in a GET /api/sessions/:id/messages response.
#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<TurnRecord> for MessageDto {
    fn from(record: TurnRecord) -> Self {
        Self {
            role: record.role.as_str().to_string(),
            content: record.content,
            intent: record.intent.map(|i| i.as_str().to_string()),
            artifact: record.artifact,
            created_at: record.created_at,
        }
    }
}

/// GET /api/sessions/:id/messages response body.
#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<MessageDto>,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// GET /health response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Intent, Role, SessionId};

    #[test]
    fn message_dto_carries_record_fields() {
        let record = TurnRecord::new(SessionId::new(), Role::Bot, "answer")
            .with_intent(Intent::Tutor)
            .with_artifact(serde_json::json!({"visualizationType": "tree"}));
        let dto = MessageDto::from(record);
        assert_eq!(dto.role, "bot");
        assert_eq!(dto.intent.as_deref(), Some("cs_tutor"));
        assert!(dto.artifact.is_some());
    }

    #[test]
    fn chat_request_parses() {
        let req: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(req.message, "hi");
    }

    #[test]
    fn create_session_request_tolerates_empty_body() {
        let req: CreateSessionRequest = serde_json::from_str("{}").unwrap();
        assert!(req.owner_id.is_none());
    }
}
