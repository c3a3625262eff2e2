//! Read-state port: per-message flags and unread aggregates.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{ConversationId, MessageId, UserId};

use super::StoreError;

#[async_trait]
pub trait ReadStateRepository: Send + Sync {
    /// Set `is_read` on a message addressed to `reader`.
    ///
    /// Returns `true` if the flag flipped, `false` if it was already set or
    /// the message is not addressed to `reader`.
    async fn mark_read(&self, id: &MessageId, reader: UserId) -> Result<bool, StoreError>;

    /// Mark every unread message addressed to `reader` in the conversation.
    ///
    /// Single statement; returns how many rows changed.
    async fn mark_conversation_read(
        &self,
        conversation_id: &ConversationId,
        reader: UserId,
    ) -> Result<u64, StoreError>;

    /// All unread messages addressed to `user`.
    async fn unread_for_user(&self, user: UserId) -> Result<u64, StoreError>;

    /// Unread messages addressed to `user` within one conversation.
    async fn unread_for_conversation(
        &self,
        conversation_id: &ConversationId,
        user: UserId,
    ) -> Result<u64, StoreError>;

    /// Unread counts for `user`, keyed by conversation. Conversations with
    /// nothing unread are absent.
    async fn unread_counts_by_conversation(
        &self,
        user: UserId,
    ) -> Result<HashMap<ConversationId, u64>, StoreError>;
}
