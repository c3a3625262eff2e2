//! HTTP handlers for messaging endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::messaging::{
    DeleteMessageCommand, DeleteMessageHandler, GetMessagesHandler, GetMessagesQuery,
    GetOrCreateConversationCommand, GetOrCreateConversationHandler, GetUnreadCountHandler,
    GetUnreadCountQuery, ListConversationsHandler, ListConversationsQuery,
    MarkConversationReadCommand, MarkConversationReadHandler, MarkMessageReadCommand,
    MarkMessageReadHandler, SendMessageCommand, SendMessageHandler,
};
use crate::domain::foundation::{ConversationId, MessageId, UserId};
use crate::domain::messaging::MessagingError;
use crate::ports::{
    ConversationRepository, MessageRepository, ProfileDirectory, ReadStateRepository,
    SnapshotPolicy, UserDirectory,
};

use super::dto::{
    ConversationListResponse, ConversationResponse, CreateConversationRequest, ErrorResponse,
    ListMessagesParams, MarkConversationReadResponse, MarkMessageReadResponse,
    MessagePageResponse, MessageResponse, SendMessageRequest, UnreadCountParams,
    UnreadCountResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

/// Transport-level limits applied before requests reach the core.
#[derive(Debug, Clone, Copy)]
pub struct MessagingLimits {
    pub max_content_length: usize,
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Expose infrastructure error detail in 5xx bodies.
    pub verbose_errors: bool,
}

impl Default for MessagingLimits {
    fn default() -> Self {
        Self {
            max_content_length: 5000,
            default_page_size: 50,
            max_page_size: 100,
            verbose_errors: false,
        }
    }
}

/// The ports every messaging handler is built from.
#[derive(Clone)]
pub struct MessagingPorts {
    pub conversations: Arc<dyn ConversationRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub read_state: Arc<dyn ReadStateRepository>,
    pub users: Arc<dyn UserDirectory>,
    pub profiles: Arc<dyn ProfileDirectory>,
}

#[derive(Clone)]
pub struct MessagingHandlers {
    get_or_create_handler: Arc<GetOrCreateConversationHandler>,
    list_conversations_handler: Arc<ListConversationsHandler>,
    send_handler: Arc<SendMessageHandler>,
    get_messages_handler: Arc<GetMessagesHandler>,
    delete_handler: Arc<DeleteMessageHandler>,
    mark_message_read_handler: Arc<MarkMessageReadHandler>,
    mark_conversation_read_handler: Arc<MarkConversationReadHandler>,
    unread_count_handler: Arc<GetUnreadCountHandler>,
    limits: MessagingLimits,
}

impl MessagingHandlers {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        get_or_create_handler: Arc<GetOrCreateConversationHandler>,
        list_conversations_handler: Arc<ListConversationsHandler>,
        send_handler: Arc<SendMessageHandler>,
        get_messages_handler: Arc<GetMessagesHandler>,
        delete_handler: Arc<DeleteMessageHandler>,
        mark_message_read_handler: Arc<MarkMessageReadHandler>,
        mark_conversation_read_handler: Arc<MarkConversationReadHandler>,
        unread_count_handler: Arc<GetUnreadCountHandler>,
        limits: MessagingLimits,
    ) -> Self {
        Self {
            get_or_create_handler,
            list_conversations_handler,
            send_handler,
            get_messages_handler,
            delete_handler,
            mark_message_read_handler,
            mark_conversation_read_handler,
            unread_count_handler,
            limits,
        }
    }

    /// Wire every handler from one set of store and directory ports.
    pub fn from_ports(
        ports: MessagingPorts,
        policy: SnapshotPolicy,
        limits: MessagingLimits,
    ) -> Self {
        let MessagingPorts {
            conversations,
            messages,
            read_state,
            users,
            profiles,
        } = ports;

        Self::new(
            Arc::new(GetOrCreateConversationHandler::new(
                conversations.clone(),
                read_state.clone(),
                users,
                profiles.clone(),
            )),
            Arc::new(ListConversationsHandler::new(
                conversations.clone(),
                read_state.clone(),
                profiles.clone(),
            )),
            Arc::new(SendMessageHandler::new(
                conversations.clone(),
                messages.clone(),
                profiles.clone(),
            )),
            Arc::new(GetMessagesHandler::new(
                conversations.clone(),
                messages.clone(),
                profiles,
            )),
            Arc::new(DeleteMessageHandler::new(messages.clone(), policy)),
            Arc::new(MarkMessageReadHandler::new(messages, read_state.clone())),
            Arc::new(MarkConversationReadHandler::new(
                conversations.clone(),
                read_state.clone(),
            )),
            Arc::new(GetUnreadCountHandler::new(conversations, read_state)),
            limits,
        )
    }

    fn error(&self, error: MessagingError) -> Response {
        handle_messaging_error(error, self.limits.verbose_errors)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Conversation handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/conversations - Inbox, most recently active first
pub async fn list_conversations(
    State(handlers): State<MessagingHandlers>,
    RequireAuth(user): RequireAuth,
) -> Response {
    let query = ListConversationsQuery { user_id: user.id };

    match handlers.list_conversations_handler.handle(query).await {
        Ok(summaries) => {
            let response: ConversationListResponse = summaries.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handlers.error(e),
    }
}

/// POST /api/conversations - Get or create the conversation with another user
pub async fn get_or_create_conversation(
    State(handlers): State<MessagingHandlers>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<CreateConversationRequest>,
) -> Response {
    let other_user = match UserId::new(req.other_user_id) {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid other_user_id"),
    };

    let cmd = GetOrCreateConversationCommand {
        requester: user.id,
        other_user,
    };

    match handlers.get_or_create_handler.handle(cmd).await {
        Ok(result) => {
            let status = if result.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            let response: ConversationResponse = result.into_summary().into();
            (status, Json(response)).into_response()
        }
        Err(e) => handlers.error(e),
    }
}

/// PUT /api/conversations/:id/read - Mark everything addressed to the caller read
pub async fn mark_conversation_read(
    State(handlers): State<MessagingHandlers>,
    RequireAuth(user): RequireAuth,
    Path(conversation_id): Path<String>,
) -> Response {
    let conversation_id = match conversation_id.parse::<ConversationId>() {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid conversation ID"),
    };

    let cmd = MarkConversationReadCommand {
        conversation_id,
        reader: user.id,
    };

    match handlers.mark_conversation_read_handler.handle(cmd).await {
        Ok(updated) => {
            (StatusCode::OK, Json(MarkConversationReadResponse { updated })).into_response()
        }
        Err(e) => handlers.error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Message handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/conversations/:id/messages?page&limit - One page of history
pub async fn list_messages(
    State(handlers): State<MessagingHandlers>,
    RequireAuth(user): RequireAuth,
    Path(conversation_id): Path<String>,
    Query(params): Query<ListMessagesParams>,
) -> Response {
    let conversation_id = match conversation_id.parse::<ConversationId>() {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid conversation ID"),
    };

    let limit = params.limit.unwrap_or(handlers.limits.default_page_size);
    if limit > handlers.limits.max_page_size {
        return handlers.error(MessagingError::validation(
            "limit",
            format!("must be at most {}", handlers.limits.max_page_size),
        ));
    }

    let query = GetMessagesQuery {
        conversation_id,
        requester: user.id,
        page: params.page.unwrap_or(1),
        page_size: limit,
    };

    match handlers.get_messages_handler.handle(query).await {
        Ok(history) => {
            let response: MessagePageResponse = history.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handlers.error(e),
    }
}

/// POST /api/conversations/:id/messages - Send a message
pub async fn send_message(
    State(handlers): State<MessagingHandlers>,
    RequireAuth(user): RequireAuth,
    Path(conversation_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    let conversation_id = match conversation_id.parse::<ConversationId>() {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid conversation ID"),
    };

    if req.content.chars().count() > handlers.limits.max_content_length {
        return handlers.error(MessagingError::validation(
            "content",
            format!(
                "must be at most {} characters",
                handlers.limits.max_content_length
            ),
        ));
    }

    let cmd = SendMessageCommand {
        conversation_id,
        sender: user.id,
        content: req.content,
        client_token: req.client_token,
    };

    match handlers.send_handler.handle(cmd).await {
        Ok(result) => {
            let status = if result.deduplicated {
                StatusCode::OK
            } else {
                StatusCode::CREATED
            };
            let response = MessageResponse::build(&result.message, result.sender_profile.as_ref());
            (status, Json(response)).into_response()
        }
        Err(e) => handlers.error(e),
    }
}

/// PUT /api/messages/:id/read - Receiver marks one message read
pub async fn mark_message_read(
    State(handlers): State<MessagingHandlers>,
    RequireAuth(user): RequireAuth,
    Path(message_id): Path<String>,
) -> Response {
    let message_id = match message_id.parse::<MessageId>() {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid message ID"),
    };

    let cmd = MarkMessageReadCommand {
        message_id,
        reader: user.id,
    };

    match handlers.mark_message_read_handler.handle(cmd).await {
        Ok(changed) => (StatusCode::OK, Json(MarkMessageReadResponse { changed })).into_response(),
        Err(e) => handlers.error(e),
    }
}

/// DELETE /api/messages/:id - Sender removes their own message
pub async fn delete_message(
    State(handlers): State<MessagingHandlers>,
    RequireAuth(user): RequireAuth,
    Path(message_id): Path<String>,
) -> Response {
    let message_id = match message_id.parse::<MessageId>() {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid message ID"),
    };

    let cmd = DeleteMessageCommand {
        message_id,
        requester: user.id,
    };

    match handlers.delete_handler.handle(cmd).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => handlers.error(e),
    }
}

/// GET /api/messages/unread-count - Global or per-conversation badge
pub async fn unread_count(
    State(handlers): State<MessagingHandlers>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<UnreadCountParams>,
) -> Response {
    let conversation_id = match params.conversation_id.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<ConversationId>() {
            Ok(id) => Some(id),
            Err(_) => return bad_request("Invalid conversation ID"),
        },
    };

    let query = GetUnreadCountQuery {
        user_id: user.id,
        conversation_id,
    };

    match handlers.unread_count_handler.handle(query).await {
        Ok(unread_count) => {
            (StatusCode::OK, Json(UnreadCountResponse { unread_count })).into_response()
        }
        Err(e) => handlers.error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error mapping
// ════════════════════════════════════════════════════════════════════════════

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::bad_request(message))).into_response()
}

pub(crate) fn handle_messaging_error(error: MessagingError, verbose: bool) -> Response {
    let status = match &error {
        MessagingError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
        MessagingError::ConversationNotFound(_)
        | MessagingError::MessageNotFound(_)
        | MessagingError::UserNotFound(_) => StatusCode::NOT_FOUND,
        MessagingError::Forbidden(_) => StatusCode::FORBIDDEN,
        MessagingError::Conflict(_) => StatusCode::CONFLICT,
        MessagingError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        MessagingError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = if let MessagingError::Infrastructure(detail) = &error {
        tracing::error!(error = %detail, "messaging request failed");
        if verbose {
            ErrorResponse::from(&error)
        } else {
            ErrorResponse::internal("Internal server error")
        }
    } else {
        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::warn!(error = %error, "messaging store unavailable");
        }
        ErrorResponse::from(&error)
    };

    (status, Json(body)).into_response()
}
