//! CodeQuest server binary - composition root.
//!
//! Loads configuration, wires the adapters behind the ports, and serves the
//! HTTP API.

use std::sync::Arc;

use codequest::adapters::ai::{GeminiConfig, GeminiProvider};
use codequest::adapters::catalog::{LeetCodeCatalog, LeetCodeConfig};
use codequest::adapters::http::{api_routes, AppState};
use codequest::adapters::persistence::{InMemoryChatStore, SupabaseChatStore, SupabaseConfig};
use codequest::application::{ChatOrchestrator, ProblemResolver};
use codequest::config::AppConfig;
use codequest::domain::SessionRegistry;
use codequest::ports::ChatStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting CodeQuest v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    config.validate()?;

    // AI provider. Validation guarantees the key is present.
    let api_key = config.ai.gemini_api_key.clone().unwrap_or_default();
    let gemini_config = GeminiConfig::new(api_key)
        .with_chat_model(&config.ai.chat_model)
        .with_structured_model(&config.ai.structured_model)
        .with_timeout(config.ai.timeout());
    let ai = Arc::new(GeminiProvider::new(gemini_config)?);

    // Problem catalog.
    let catalog_config = LeetCodeConfig {
        base_url: config.catalog.base_url.clone(),
        timeout: config.catalog.timeout(),
    };
    let catalog = Arc::new(LeetCodeCatalog::new(catalog_config)?);
    let resolver = Arc::new(ProblemResolver::new(catalog));

    // Persistence: Supabase when configured, otherwise in-memory.
    let store: Arc<dyn ChatStore> = if config.database.has_supabase() {
        let supabase = SupabaseChatStore::new(SupabaseConfig::new(
            config.database.supabase_url.clone().unwrap_or_default(),
            config.database.supabase_key.clone().unwrap_or_default(),
        ))?;
        tracing::info!("Using Supabase persistence");
        Arc::new(supabase)
    } else {
        tracing::warn!("No Supabase configured; chat history is in-memory only");
        Arc::new(InMemoryChatStore::new())
    };

    let sessions = Arc::new(SessionRegistry::default());
    let orchestrator = ChatOrchestrator::new(sessions, ai, resolver, store.clone());

    let app = api_routes(AppState {
        orchestrator,
        store,
    });

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
