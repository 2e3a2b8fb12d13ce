use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in loki-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Errors surfaced by the chat service.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("conversation not found")]
    ConversationNotFound,

    #[error("completion failed: {0}")]
    Provider(#[from] LlmError),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for ChatError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ChatError::ConversationNotFound,
            other => ChatError::Storage(other.to_string()),
        }
    }
}
