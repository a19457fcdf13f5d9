//! HTTP handlers for the chat API.
//!
//! The chat endpoint identifies the session through the `X-Session-ID`
//! header and relays the orchestrator's event channel as SSE frames, one
//! frame per output event, named after the event kind.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::Stream;
use thiserror::Error;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::warn;

use crate::application::ChatOrchestrator;
use crate::domain::SessionId;
use crate::ports::{ChatStore, ChatStoreError};

use super::dto::{
    ChatRequest, CreateSessionRequest, CreateSessionResponse, ErrorResponse, HealthResponse,
    MessageDto, MessageListResponse, RenameSessionRequest,
};

/// Session id header for the chat endpoint.
pub const SESSION_HEADER: &str = "x-session-id";

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: ChatOrchestrator,
    pub store: Arc<dyn ChatStore>,
}

/// API-level error with its HTTP mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("storage error")]
    Storage,
}

impl From<ChatStoreError> for ApiError {
    fn from(err: ChatStoreError) -> Self {
        match err {
            ChatStoreError::SessionNotFound(id) => ApiError::SessionNotFound(id),
            ChatStoreError::Storage(detail) => {
                warn!(error = %detail, "chat store request failed");
                ApiError::Storage
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

fn session_id_from_headers(headers: &HeaderMap) -> Result<SessionId, ApiError> {
    let raw = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("missing X-Session-ID header".to_string()))?;
    raw.parse::<SessionId>()
        .map_err(|_| ApiError::BadRequest("X-Session-ID must be a UUID".to_string()))
}

/// POST /api/chat - run one conversation turn, streaming the output.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let session_id = session_id_from_headers(&headers)?;

    let rx = state.orchestrator.handle_turn(session_id, request.message);
    let stream = ReceiverStream::new(rx).filter_map(|event| {
        match Event::default().event(event.kind()).json_data(&event) {
            Ok(frame) => Some(Ok(frame)),
            Err(err) => {
                warn!(error = %err, "failed to encode SSE frame; skipping");
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

/// POST /api/sessions - create a durable session.
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let session_id = state
        .store
        .create_session(request.owner_id.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session_id.to_string(),
        }),
    ))
}

/// GET /api/sessions/:id/messages - a session's persisted history.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let session_id = parse_session_path(&session_id)?;
    let messages = state
        .store
        .list_messages(session_id)
        .await?
        .into_iter()
        .map(MessageDto::from)
        .collect();
    Ok(Json(MessageListResponse { messages }))
}

/// PATCH /api/sessions/:id/rename - rename a session.
pub async fn rename_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<RenameSessionRequest>,
) -> Result<StatusCode, ApiError> {
    let session_id = parse_session_path(&session_id)?;
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    state
        .store
        .rename_session(session_id, request.name.trim())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /health - liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

fn parse_session_path(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse::<SessionId>()
        .map_err(|_| ApiError::BadRequest("invalid session id".to_string()))
}
