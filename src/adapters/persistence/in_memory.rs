//! In-memory chat store for tests and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::SessionId;
use crate::ports::{ChatStore, ChatStoreError, TurnRecord};

/// `ChatStore` backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryChatStore {
    sessions: Mutex<HashMap<SessionId, String>>,
    messages: Mutex<Vec<TurnRecord>>,
    /// When set, every write fails.
    failing: bool,
}

impl InMemoryChatStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose writes always fail, for resilience tests.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Every record appended so far, in insertion order.
    pub fn recorded(&self) -> Vec<TurnRecord> {
        self.messages.lock().expect("store poisoned").clone()
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn create_session(&self, _owner_id: Option<&str>) -> Result<SessionId, ChatStoreError> {
        if self.failing {
            return Err(ChatStoreError::Storage("store unavailable".to_string()));
        }
        let id = SessionId::new();
        self.sessions
            .lock()
            .expect("store poisoned")
            .insert(id, "New chat".to_string());
        Ok(id)
    }

    async fn append_message(&self, record: TurnRecord) -> Result<(), ChatStoreError> {
        if self.failing {
            return Err(ChatStoreError::Storage("store unavailable".to_string()));
        }
        self.messages.lock().expect("store poisoned").push(record);
        Ok(())
    }

    async fn list_messages(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<TurnRecord>, ChatStoreError> {
        Ok(self
            .messages
            .lock()
            .expect("store poisoned")
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn rename_session(
        &self,
        session_id: SessionId,
        name: &str,
    ) -> Result<(), ChatStoreError> {
        if self.failing {
            return Err(ChatStoreError::Storage("store unavailable".to_string()));
        }
        match self
            .sessions
            .lock()
            .expect("store poisoned")
            .get_mut(&session_id)
        {
            Some(slot) => {
                *slot = name.to_string();
                Ok(())
            }
            None => Err(ChatStoreError::SessionNotFound(session_id)),
        }
    }
}
