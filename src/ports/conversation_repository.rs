//! Conversation repository port.
//!
//! One row per unordered participant pair. The store enforces uniqueness of
//! `(participant_low, participant_high)`; callers resolve duplicate-key
//! races by re-fetching.

use async_trait::async_trait;

use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::messaging::{Conversation, ParticipantPair};

use super::StoreError;

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Find a conversation by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError>;

    /// Find the conversation for a canonical pair.
    async fn find_by_pair(&self, pair: &ParticipantPair)
        -> Result<Option<Conversation>, StoreError>;

    /// Insert a new conversation.
    ///
    /// # Errors
    ///
    /// - `UniqueViolation` if the pair already has a conversation
    async fn insert(&self, conversation: &Conversation) -> Result<(), StoreError>;

    /// Every conversation containing `user`, most recently active first.
    async fn list_for_user(&self, user: UserId) -> Result<Vec<Conversation>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_repository_is_object_safe() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ConversationRepository>();
    }
}
