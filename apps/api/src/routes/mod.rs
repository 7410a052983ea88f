pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Chat API
        .route("/api/v1/chat/start", post(handlers::handle_start))
        .route("/api/v1/chat/message", post(handlers::handle_message))
        .route(
            "/api/v1/chat/conversations",
            get(handlers::handle_list_conversations),
        )
        .route(
            "/api/v1/chat/conversations/:id",
            get(handlers::handle_get_conversation).delete(handlers::handle_delete_conversation),
        )
        .route(
            "/api/v1/chat/conversations/:id/messages",
            get(handlers::handle_list_messages),
        )
        .route(
            "/api/v1/chat/conversations/:id/profile",
            get(handlers::handle_conversation_profile),
        )
        .route(
            "/api/v1/chat/conversations/:id/abandon",
            post(handlers::handle_abandon),
        )
        // Candidates API
        .route("/api/v1/candidates/:id", get(handlers::handle_get_candidate))
        // Transcript archive
        .route(
            "/api/v1/archive/search",
            get(handlers::handle_archive_search),
        )
        .route(
            "/api/v1/archive/conversations/:id",
            get(handlers::handle_archive_conversation),
        )
        .route("/api/v1/archive/stats", get(handlers::handle_archive_stats))
        .with_state(state)
}
