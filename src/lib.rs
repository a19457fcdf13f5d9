//! CodeQuest - AI Coding Tutor Backend
//!
//! Routes user chat turns to either an LLM responder or a structured lookup
//! against an external coding-problem catalog, streams answers back over
//! Server-Sent-Events, and persists turns for later retrieval.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod prompts;
