//! ConversationRepository trait definition.
//!
//! Provides persistence for conversations and their messages.
//! Uses the same RPITIT pattern as `LlmProvider`.

use chrono::NaiveDateTime;
use loki_types::chat::{ChatMessage, Conversation, ConversationId};
use loki_types::error::RepositoryError;

/// Repository trait for conversation and message persistence.
///
/// Implementations live in loki-infra (e.g., `SqliteConversationRepository`).
/// Every store fault surfaces as `RepositoryError::Query`.
pub trait ConversationRepository: Send + Sync {
    /// Persist a new conversation with no messages.
    fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Get a conversation by its unique ID.
    fn get_conversation(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// List conversations ordered by updated_at DESC, optionally capped.
    fn list_conversations(
        &self,
        limit: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// Case-insensitive substring match on the title, ordered by updated_at DESC.
    fn search_conversations(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// Replace the title. Returns `NotFound` when the conversation does not exist.
    fn update_title(
        &self,
        id: &ConversationId,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a conversation and, by cascade, all of its messages.
    ///
    /// Returns `NotFound` when nothing was deleted.
    fn delete_conversation(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Atomically append a user/assistant pair and bump `updated_at`.
    ///
    /// Either both messages and the timestamp change persist, or nothing
    /// does. Returns `NotFound` if the conversation no longer exists.
    fn append_exchange(
        &self,
        id: &ConversationId,
        user: &ChatMessage,
        assistant: &ChatMessage,
        updated_at: NaiveDateTime,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// All messages of a conversation, oldest first.
    fn get_messages(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Up to `limit` messages, newest first, skipping the `offset` newest.
    fn get_message_page(
        &self,
        id: &ConversationId,
        offset: i64,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;
}
