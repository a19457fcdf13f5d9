//! Supabase chat store - implementation of `ChatStore` over the PostgREST
//! interface.
//!
//! Two tables: `chat_sessions` (id, name, owner_id, created_at) and
//! `chat_messages` (session_id, role, content, intent, artifact, created_at).

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{ChatStore, ChatStoreError, TurnRecord};
use crate::domain::SessionId;

/// Configuration for the Supabase chat store.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Service role or anon API key.
    api_key: Secret<String>,
    /// Request timeout.
    pub timeout: Duration,
}

impl SupabaseConfig {
    /// Creates a configuration for the given project.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: Secret::new(api_key.into()),
            timeout: Duration::from_secs(10),
        }
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

/// Chat store backed by Supabase's REST interface.
pub struct SupabaseChatStore {
    config: SupabaseConfig,
    client: Client,
}

impl SupabaseChatStore {
    /// Creates a store with the given configuration.
    pub fn new(config: SupabaseConfig) -> Result<Self, ChatStoreError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChatStoreError::Storage(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.config.url)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", self.config.api_key())
            .bearer_auth(self.config.api_key())
    }

    async fn check(
        response: Result<reqwest::Response, reqwest::Error>,
        context: &str,
    ) -> Result<reqwest::Response, ChatStoreError> {
        let response =
            response.map_err(|e| ChatStoreError::Storage(format!("{context}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatStoreError::Storage(format!(
                "{context}: status {status}: {body}"
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatStore for SupabaseChatStore {
    async fn create_session(&self, owner_id: Option<&str>) -> Result<SessionId, ChatStoreError> {
        let session_id = SessionId::new();
        let row = SessionRow {
            id: session_id,
            name: "New chat".to_string(),
            owner_id: owner_id.map(str::to_string),
        };

        let response = self
            .request(self.client.post(self.table_url("chat_sessions")))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await;
        Self::check(response, "create session").await?;
        Ok(session_id)
    }

    async fn append_message(&self, record: TurnRecord) -> Result<(), ChatStoreError> {
        let response = self
            .request(self.client.post(self.table_url("chat_messages")))
            .header("Prefer", "return=minimal")
            .json(&record)
            .send()
            .await;
        Self::check(response, "append message").await?;
        Ok(())
    }

    async fn list_messages(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<TurnRecord>, ChatStoreError> {
        let response = self
            .request(self.client.get(self.table_url("chat_messages")))
            .query(&[
                ("session_id", format!("eq.{session_id}")),
                ("order", "created_at.asc".to_string()),
            ])
            .send()
            .await;
        let response = Self::check(response, "list messages").await?;
        response
            .json()
            .await
            .map_err(|e| ChatStoreError::Storage(format!("list messages: {e}")))
    }

    async fn rename_session(
        &self,
        session_id: SessionId,
        name: &str,
    ) -> Result<(), ChatStoreError> {
        let response = self
            .request(self.client.patch(self.table_url("chat_sessions")))
            .query(&[("id", format!("eq.{session_id}"))])
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await;
        let response = Self::check(response, "rename session").await?;

        // PostgREST returns the updated rows; zero rows means no such id.
        let rows: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| ChatStoreError::Storage(format!("rename session: {e}")))?;
        if rows.is_empty() {
            return Err(ChatStoreError::SessionNotFound(session_id));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionRow {
    id: SessionId,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner_id: Option<String>,
}
