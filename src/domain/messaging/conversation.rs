//! Conversation aggregate.
//!
//! A conversation is the persistent 1:1 relationship record between two
//! users. It is created on first contact, never deleted, and caches a
//! snapshot of its most recent message for conversation lists.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, DomainError, Timestamp, UserId};

use super::{Message, ParticipantPair};

/// Denormalized copy of the newest message, kept for list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessageSnapshot {
    pub content: String,
    pub created_at: Timestamp,
    pub sender_id: UserId,
}

impl LastMessageSnapshot {
    /// Builds a snapshot from a message.
    pub fn of(message: &Message) -> Self {
        Self {
            content: message.content().to_string(),
            created_at: *message.created_at(),
            sender_id: message.sender_id(),
        }
    }
}

/// Conversation aggregate - one per unordered participant pair.
///
/// # Invariants
///
/// - `pair` is canonical (`low < high`)
/// - `updated_at >= created_at`, and strictly increases with every message
/// - `last_message`, when present, describes the most recently recorded message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    pair: ParticipantPair,
    created_at: Timestamp,
    updated_at: Timestamp,
    last_message: Option<LastMessageSnapshot>,
}

impl Conversation {
    /// Start a new, empty conversation for a pair.
    pub fn start(pair: ParticipantPair) -> Self {
        let now = Timestamp::now();
        Self {
            id: ConversationId::new(),
            pair,
            created_at: now,
            updated_at: now,
            last_message: None,
        }
    }

    /// Reconstitute a conversation from persistence (no validation).
    pub fn reconstitute(
        id: ConversationId,
        pair: ParticipantPair,
        created_at: Timestamp,
        updated_at: Timestamp,
        last_message: Option<LastMessageSnapshot>,
    ) -> Self {
        Self {
            id,
            pair,
            created_at,
            updated_at,
            last_message,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn pair(&self) -> &ParticipantPair {
        &self.pair
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    pub fn last_message(&self) -> Option<&LastMessageSnapshot> {
        self.last_message.as_ref()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────

    /// Checks if the user is one of the two participants.
    pub fn is_participant(&self, user: UserId) -> bool {
        self.pair.contains(user)
    }

    /// Validates that the user may read or write this conversation.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the user is not a participant
    pub fn authorize(&self, user: UserId) -> Result<(), DomainError> {
        if self.is_participant(user) {
            Ok(())
        } else {
            Err(DomainError::forbidden(
                "User is not a participant of this conversation",
            ))
        }
    }

    /// Returns the participant on the other side from `user`.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the user is not a participant
    pub fn other_participant(&self, user: UserId) -> Result<UserId, DomainError> {
        self.pair.other(user).ok_or_else(|| {
            DomainError::forbidden("User is not a participant of this conversation")
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Summary maintenance
    // ─────────────────────────────────────────────────────────────────────────

    /// Timestamp to assign to the next message appended at `now`.
    ///
    /// Never earlier than one microsecond after the last recorded activity,
    /// so message times and `updated_at` are strictly increasing even when
    /// the clock stalls or steps backwards.
    pub fn next_message_time(&self, now: Timestamp) -> Timestamp {
        now.strictly_after(&self.updated_at)
    }

    /// Reflect a newly appended message in the summary.
    pub fn record_message(&mut self, message: &Message) {
        debug_assert_eq!(message.conversation_id(), &self.id);
        self.last_message = Some(LastMessageSnapshot::of(message));
        if message.created_at().is_after(&self.updated_at) {
            self.updated_at = *message.created_at();
        }
    }

    /// Replace the snapshot after the newest message was removed.
    ///
    /// `updated_at` is left alone: it tracks activity, not content.
    pub fn replace_snapshot(&mut self, newest_surviving: Option<&Message>) {
        self.last_message = newest_surviving.map(LastMessageSnapshot::of);
    }
}
