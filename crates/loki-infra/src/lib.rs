//! Infrastructure layer for Loki Chat.
//!
//! Contains implementations of the traits defined in `loki-core`: SQLite
//! conversation storage and the OpenAI-compatible completion provider, plus
//! config file loading and data directory resolution.

pub mod config;
pub mod filesystem;
pub mod llm;
pub mod sqlite;
