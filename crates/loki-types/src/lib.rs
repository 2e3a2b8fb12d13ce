//! Shared domain types for Loki Chat.
//!
//! Conversations, messages, provider request/response shapes, API transfer
//! objects, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod dto;
pub mod error;
pub mod llm;
