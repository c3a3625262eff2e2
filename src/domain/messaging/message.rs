//! Message entity and the validated draft it is built from.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{ConversationId, DomainError, MessageId, Timestamp, UserId};

use super::Conversation;

/// A validated, not yet persisted message.
///
/// Built only through [`MessageDraft::compose`], which derives the receiver
/// from the conversation, so a draft always satisfies the participant
/// invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    conversation_id: ConversationId,
    sender_id: UserId,
    receiver_id: UserId,
    content: String,
    client_token: Option<Uuid>,
}

impl MessageDraft {
    /// Validate a send request against its conversation.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the sender is not a participant
    /// - `ValidationFailed` if the content is blank after trimming
    pub fn compose(
        conversation: &Conversation,
        sender_id: UserId,
        content: &str,
        client_token: Option<Uuid>,
    ) -> Result<Self, DomainError> {
        let receiver_id = conversation.other_participant(sender_id)?;

        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::validation(
                "content",
                "Message content cannot be empty",
            ));
        }

        Ok(Self {
            conversation_id: *conversation.id(),
            sender_id,
            receiver_id,
            content: content.to_string(),
            client_token,
        })
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn sender_id(&self) -> UserId {
        self.sender_id
    }

    pub fn receiver_id(&self) -> UserId {
        self.receiver_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn client_token(&self) -> Option<Uuid> {
        self.client_token
    }
}

/// An appended, immutable message. Only `is_read` ever changes.
///
/// # Invariants
///
/// - `sender_id != receiver_id`
/// - `content` is trimmed and non-empty
/// - `(created_at, sequence)` is unique and increasing within a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    conversation_id: ConversationId,
    sequence: i64,
    sender_id: UserId,
    receiver_id: UserId,
    content: String,
    created_at: Timestamp,
    is_read: bool,
    client_token: Option<Uuid>,
}

impl Message {
    /// Materialize a draft once the store has assigned id, sequence and time.
    pub fn from_draft(
        draft: MessageDraft,
        id: MessageId,
        sequence: i64,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            conversation_id: draft.conversation_id,
            sequence,
            sender_id: draft.sender_id,
            receiver_id: draft.receiver_id,
            content: draft.content,
            created_at,
            is_read: false,
            client_token: draft.client_token,
        }
    }

    /// Reconstitute a message from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: MessageId,
        conversation_id: ConversationId,
        sequence: i64,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        created_at: Timestamp,
        is_read: bool,
        client_token: Option<Uuid>,
    ) -> Self {
        Self {
            id,
            conversation_id,
            sequence,
            sender_id,
            receiver_id,
            content,
            created_at,
            is_read,
            client_token,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Store-assigned insertion sequence; breaks `created_at` ties.
    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    pub fn sender_id(&self) -> UserId {
        self.sender_id
    }

    pub fn receiver_id(&self) -> UserId {
        self.receiver_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn client_token(&self) -> Option<Uuid> {
        self.client_token
    }

    /// Total order of messages within a conversation.
    pub fn ordering_key(&self) -> (Timestamp, i64) {
        (self.created_at, self.sequence)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Flip the read flag on behalf of the receiver.
    ///
    /// Returns `true` if the flag changed, `false` if it was already set.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if `reader` is not the receiver
    pub fn mark_read(&mut self, reader: UserId) -> Result<bool, DomainError> {
        if reader != self.receiver_id {
            return Err(DomainError::forbidden(
                "Only the receiver can mark a message as read",
            ));
        }
        if self.is_read {
            return Ok(false);
        }
        self.is_read = true;
        Ok(true)
    }

    /// Validates that `requester` may delete this message.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if `requester` is not the sender
    pub fn authorize_delete(&self, requester: UserId) -> Result<(), DomainError> {
        if requester == self.sender_id {
            Ok(())
        } else {
            Err(DomainError::forbidden(
                "Only the sender can delete a message",
            ))
        }
    }
}
