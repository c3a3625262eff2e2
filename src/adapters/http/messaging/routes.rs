//! HTTP routes for messaging endpoints.

use axum::{
    routing::{get, put},
    Router,
};

use super::handlers::{
    delete_message, get_or_create_conversation, list_conversations, list_messages,
    mark_conversation_read, mark_message_read, send_message, unread_count, MessagingHandlers,
};

/// Routes mounted under `/api/conversations`.
pub fn conversation_routes(handlers: MessagingHandlers) -> Router {
    Router::new()
        .route("/", get(list_conversations).post(get_or_create_conversation))
        .route("/:id/messages", get(list_messages).post(send_message))
        .route("/:id/read", put(mark_conversation_read))
        .with_state(handlers)
}

/// Routes mounted under `/api/messages`.
pub fn message_routes(handlers: MessagingHandlers) -> Router {
    Router::new()
        .route("/unread-count", get(unread_count))
        .route("/:id", axum::routing::delete(delete_message))
        .route("/:id/read", put(mark_message_read))
        .with_state(handlers)
}
