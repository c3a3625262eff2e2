//! HTTP DTOs for messaging endpoints.
//!
//! These types decouple the HTTP API from domain types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::handlers::messaging::{ConversationSummary, MessageHistory};
use crate::domain::foundation::UserId;
use crate::domain::messaging::{
    Conversation, FailureState, LastMessageSnapshot, Message, MessagingError,
};
use crate::ports::UserProfile;

// ════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/conversations`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateConversationRequest {
    pub other_user_id: i64,
}

/// Body of `POST /api/conversations/:id/messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(default)]
    pub client_token: Option<Uuid>,
}

/// Query string of `GET /api/conversations/:id/messages`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMessagesParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Query string of `GET /api/messages/unread-count`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnreadCountParams {
    pub conversation_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════

/// Public view of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserSummary {
    pub fn resolve(id: UserId, profile: Option<&UserProfile>) -> Self {
        Self {
            id: id.as_i64(),
            display_name: profile.map(|p| p.display_name.clone()),
            avatar_url: profile.and_then(|p| p.avatar_url.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LastMessageResponse {
    pub content: String,
    pub created_at: String,
    pub sender_id: i64,
}

impl From<&LastMessageSnapshot> for LastMessageResponse {
    fn from(snapshot: &LastMessageSnapshot) -> Self {
        Self {
            content: snapshot.content.clone(),
            created_at: snapshot.created_at.as_datetime().to_rfc3339(),
            sender_id: snapshot.sender_id.as_i64(),
        }
    }
}

/// A conversation as seen by one participant.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationResponse {
    pub id: String,
    pub other_user: UserSummary,
    pub last_message: Option<LastMessageResponse>,
    pub unread_count: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl ConversationResponse {
    fn build(
        conversation: &Conversation,
        other_user: UserSummary,
        unread_count: u64,
    ) -> Self {
        Self {
            id: conversation.id().to_string(),
            other_user,
            last_message: conversation.last_message().map(Into::into),
            unread_count,
            created_at: conversation.created_at().as_datetime().to_rfc3339(),
            updated_at: conversation.updated_at().as_datetime().to_rfc3339(),
        }
    }
}

impl From<ConversationSummary> for ConversationResponse {
    fn from(summary: ConversationSummary) -> Self {
        let other = UserSummary::resolve(summary.other_participant, summary.other_profile.as_ref());
        Self::build(&summary.conversation, other, summary.unread_count)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationListResponse {
    pub items: Vec<ConversationResponse>,
    pub total: usize,
}

impl From<Vec<ConversationSummary>> for ConversationListResponse {
    fn from(summaries: Vec<ConversationSummary>) -> Self {
        let items: Vec<ConversationResponse> = summaries.into_iter().map(Into::into).collect();
        Self {
            total: items.len(),
            items,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub sender: UserSummary,
    pub receiver_id: i64,
    pub content: String,
    pub created_at: String,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_token: Option<Uuid>,
}

impl MessageResponse {
    pub fn build(message: &Message, sender_profile: Option<&UserProfile>) -> Self {
        Self {
            id: message.id().to_string(),
            conversation_id: message.conversation_id().to_string(),
            sender: UserSummary::resolve(message.sender_id(), sender_profile),
            receiver_id: message.receiver_id().as_i64(),
            content: message.content().to_string(),
            created_at: message.created_at().as_datetime().to_rfc3339(),
            is_read: message.is_read(),
            client_token: message.client_token(),
        }
    }
}

/// One page of history, oldest-first.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePageResponse {
    pub items: Vec<MessageResponse>,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

impl From<MessageHistory> for MessagePageResponse {
    fn from(history: MessageHistory) -> Self {
        let profiles: &HashMap<UserId, UserProfile> = &history.profiles;
        Self {
            items: history
                .page
                .messages
                .iter()
                .map(|m| MessageResponse::build(m, profiles.get(&m.sender_id())))
                .collect(),
            page: history.page.page,
            limit: history.page.page_size,
            has_more: history.page.has_more,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkConversationReadResponse {
    pub updated: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkMessageReadResponse {
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnreadCountResponse {
    pub unread_count: u64,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    /// Whether resubmitting the same request is safe.
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<FailureState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn plain(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            retryable: false,
            state: None,
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::plain("BAD_REQUEST", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::plain("INTERNAL_ERROR", message)
    }
}

impl From<&MessagingError> for ErrorResponse {
    fn from(err: &MessagingError) -> Self {
        let mut response = Self::plain(&err.code().to_string(), err.message());
        response.retryable = err.is_retryable();
        response.state = err.failure_state();
        if let MessagingError::ValidationFailed { field, .. } = err {
            response.details = Some(serde_json::json!({ "field": field }));
        }
        response
    }
}
