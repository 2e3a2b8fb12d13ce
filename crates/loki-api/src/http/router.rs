//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/chat/`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let chat_routes = Router::new()
        .route("/message", post(handlers::chat::send_message))
        .route("/conversations", get(handlers::chat::list_conversations))
        .route(
            "/conversations/recent",
            get(handlers::chat::recent_conversations),
        )
        .route(
            "/conversations/search",
            get(handlers::chat::search_conversations),
        )
        .route(
            "/conversations/{id}",
            get(handlers::chat::get_conversation).delete(handlers::chat::delete_conversation),
        )
        .route(
            "/conversations/{id}/messages",
            get(handlers::chat::get_messages),
        )
        .route(
            "/conversations/{id}/history",
            get(handlers::chat::get_history),
        )
        .route(
            "/conversations/{id}/title",
            put(handlers::chat::rename_conversation),
        )
        .route("/health", get(handlers::chat::health));

    Router::new()
        .nest("/api/v1/chat", chat_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
