//! Conversation orchestration for Loki Chat.
//!
//! - `repository`: the `ConversationRepository` port implemented by loki-infra
//! - `context`: completion request assembly (simple and history-augmented)
//! - `title`: title generation for new conversations
//! - `service`: `ChatService`, the entry point used by the API and CLI

pub mod context;
pub mod repository;
pub mod service;
pub mod title;

pub use context::CompletionSettings;
pub use service::ChatService;
