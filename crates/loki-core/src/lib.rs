//! Business logic and repository trait definitions for Loki Chat.
//!
//! This crate defines the "ports" (repository and provider traits) that the
//! infrastructure layer implements, plus the chat orchestration service.
//! It depends only on `loki-types` -- never on `loki-infra` or any
//! database/IO crate.

pub mod chat;
pub mod llm;
