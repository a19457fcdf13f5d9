//! Ports - interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! core and the outside world; adapters implement them. Three collaborators
//! exist: the LLM responder, the problem catalog, and durable chat storage.

mod ai_provider;
mod catalog;
mod chat_store;

pub use ai_provider::{
    AiError, AiProvider, CompletionRequest, Message, MessageRole, StreamChunk,
};
pub use catalog::{CatalogError, ProblemCatalog};
pub use chat_store::{ChatStore, ChatStoreError, TurnRecord};
