//! HTTP/REST API layer for Loki Chat.
//!
//! Axum-based REST API at `/api/v1/chat/` with a JSON error envelope and
//! permissive CORS.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
