//! HTTP routes for the chat API.

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{chat, create_session, health, list_messages, rename_session, AppState};

/// Creates the full API router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id/messages", get(list_messages))
        .route("/api/sessions/:id/rename", patch(rename_session))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
