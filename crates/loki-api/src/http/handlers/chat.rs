//! Conversation HTTP handlers.
//!
//! Endpoints (all under `/api/v1/chat`):
//! - POST   /message                        - Send a message, optionally continuing a conversation
//! - GET    /conversations                  - List conversations, most recently updated first
//! - GET    /conversations/recent           - The 10 most recently updated conversations
//! - GET    /conversations/search?title=    - Case-insensitive title search
//! - GET    /conversations/{id}             - One conversation with its messages
//! - GET    /conversations/{id}/messages    - Messages, oldest first
//! - GET    /conversations/{id}/history     - One page of messages, newest first
//! - PUT    /conversations/{id}/title       - Rename (raw body is the new title)
//! - DELETE /conversations/{id}             - Delete a conversation
//! - GET    /health                         - Liveness text

use axum::Json;
use axum::extract::{Path, Query, State};

use loki_types::dto::{
    ConversationResponse, MessageResponse, SendMessageRequest, SendMessageResponse,
};

use crate::http::error::AppError;
use crate::http::extractors::query::{HistoryQuery, SearchQuery};
use crate::state::AppState;

/// POST /api/v1/chat/message
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let response = state
        .chat_service
        .process_message(&body.message, body.conversation_id.as_deref())
        .await?;
    Ok(Json(response))
}

/// GET /api/v1/chat/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConversationResponse>>, AppError> {
    Ok(Json(state.chat_service.list_conversations().await?))
}

/// GET /api/v1/chat/conversations/recent
pub async fn recent_conversations(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConversationResponse>>, AppError> {
    Ok(Json(state.chat_service.recent_conversations().await?))
}

/// GET /api/v1/chat/conversations/search?title=...
///
/// A missing `title` is treated like a blank one.
pub async fn search_conversations(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ConversationResponse>>, AppError> {
    let title = query.title.unwrap_or_default();
    Ok(Json(state.chat_service.search_conversations(&title).await?))
}

/// GET /api/v1/chat/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationResponse>, AppError> {
    Ok(Json(state.chat_service.get_conversation(&id).await?))
}

/// GET /api/v1/chat/conversations/{id}/messages
pub async fn get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    Ok(Json(state.chat_service.get_messages(&id).await?))
}

/// GET /api/v1/chat/conversations/{id}/history?page=&size=
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let page = state
        .chat_service
        .get_history(&id, query.page, query.size)
        .await?;
    Ok(Json(page))
}

/// PUT /api/v1/chat/conversations/{id}/title
pub async fn rename_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    title: String,
) -> Result<Json<ConversationResponse>, AppError> {
    Ok(Json(
        state.chat_service.rename_conversation(&id, &title).await?,
    ))
}

/// DELETE /api/v1/chat/conversations/{id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<&'static str, AppError> {
    state.chat_service.delete_conversation(&id).await?;
    Ok("Deleted successfully")
}

/// GET /api/v1/chat/health
pub async fn health() -> &'static str {
    "Chat service is running"
}
