//! Conversation and message types for Loki Chat.
//!
//! A conversation is a titled, time-ordered thread of messages. Each message
//! is authored by either the end user or the assistant and belongs to exactly
//! one conversation.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::llm::MessageRole;

/// Text format used for timestamps on the wire and in storage.
///
/// Local wall-clock time with fixed-width microseconds and no zone, so that
/// the textual form sorts the same way as the instant it encodes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Current local wall-clock time, truncated to microsecond precision.
pub fn now_local() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(now.nanosecond() / 1_000 * 1_000).unwrap_or(now)
}

/// Render a timestamp in [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp written by [`format_timestamp`].
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
}

/// Unique identifier for a conversation, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub Uuid);

impl ConversationId {
    /// Create a new ConversationId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create a ConversationId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// Author of a persisted chat message.
///
/// Only the two conversational roles are ever stored. Maps to the CHECK
/// constraint in the SQLite schema: `CHECK (role IN ('user', 'assistant'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            other => Err(format!("invalid chat role: '{other}'")),
        }
    }
}

impl From<ChatRole> for MessageRole {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => MessageRole::User,
            ChatRole::Assistant => MessageRole::Assistant,
        }
    }
}

/// A titled thread of messages.
///
/// `updated_at` moves forward every time a user/assistant exchange is
/// appended; `created_at` never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Conversation {
    /// Start a new, empty conversation stamped with the current local time.
    pub fn new(title: impl Into<String>) -> Self {
        let now = now_local();
        Self {
            id: ConversationId::new(),
            title: title.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single turn within a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub conversation_id: ConversationId,
    pub role: ChatRole,
    pub content: String,
    pub created_at: NaiveDateTime,
    /// Output tokens reported by the provider (assistant messages only).
    pub token_count: Option<u32>,
    /// Completion latency in milliseconds (assistant messages only).
    pub processing_time_ms: Option<u64>,
}

impl ChatMessage {
    /// Build a user message stamped with the current local time.
    pub fn user(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            conversation_id,
            role: ChatRole::User,
            content: content.into(),
            created_at: now_local(),
            token_count: None,
            processing_time_ms: None,
        }
    }

    /// Build an assistant message that is never stamped earlier than `after`.
    pub fn assistant(
        conversation_id: ConversationId,
        content: impl Into<String>,
        after: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            conversation_id,
            role: ChatRole::Assistant,
            content: content.into(),
            created_at: now_local().max(after),
            token_count: None,
            processing_time_ms: None,
        }
    }
}
