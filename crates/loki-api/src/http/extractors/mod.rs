//! Request extractors shared by the chat handlers.

pub mod query;
