//! Message repository port.
//!
//! Appending a message and refreshing its conversation's summary happen in
//! one atomic unit owned by the adapter.

use async_trait::async_trait;

use crate::domain::foundation::{ConversationId, MessageId};
use crate::domain::messaging::{Conversation, Message, MessageDraft};

use super::StoreError;

/// Outcome of an append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendResult {
    pub message: Message,
    /// Conversation as it stands after the append.
    pub conversation: Conversation,
    /// `true` when a message with the same client token already existed and
    /// was returned instead of writing a new one.
    pub deduplicated: bool,
}

/// What to do with the conversation summary when a message is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotPolicy {
    /// Leave `last_message` untouched, even if it described the removed message.
    #[default]
    Keep,
    /// Rebuild `last_message` from the newest surviving message.
    Recompute,
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append a message and update the conversation summary atomically.
    ///
    /// The conversation row is held exclusively for the duration, so
    /// concurrent appends to one conversation serialize. The message's
    /// `created_at` is strictly later than the conversation's previous
    /// `updated_at`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the conversation vanished
    /// - `Unavailable` if nothing was written
    /// - `CommitUncertain` if the commit outcome is unknown
    async fn append(&self, draft: &MessageDraft) -> Result<AppendResult, StoreError>;

    /// Find a message by its ID.
    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, StoreError>;

    /// Hard-delete a message.
    ///
    /// Returns `false` if it was already gone.
    async fn delete(&self, id: &MessageId, policy: SnapshotPolicy) -> Result<bool, StoreError>;

    /// Up to `limit` messages after skipping `offset`, ordered
    /// `(created_at DESC, sequence DESC)`.
    async fn newest_first(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Message>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_keeps_snapshot() {
        assert_eq!(SnapshotPolicy::default(), SnapshotPolicy::Keep);
    }

    #[test]
    fn message_repository_is_object_safe() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn MessageRepository>();
    }
}
