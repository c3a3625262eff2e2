//! GetUnreadCountHandler - Badge counts, global or per conversation.

use std::sync::Arc;

use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::messaging::MessagingError;
use crate::ports::{ConversationRepository, ReadStateRepository};

use super::access::load_for_participant;
use super::retry::retry_read;

/// Query for unread counts.
#[derive(Debug, Clone)]
pub struct GetUnreadCountQuery {
    pub user_id: UserId,
    /// Restrict the count to one conversation the user takes part in.
    pub conversation_id: Option<ConversationId>,
}

/// Handler for unread counts.
pub struct GetUnreadCountHandler {
    conversations: Arc<dyn ConversationRepository>,
    read_state: Arc<dyn ReadStateRepository>,
}

impl GetUnreadCountHandler {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        read_state: Arc<dyn ReadStateRepository>,
    ) -> Self {
        Self {
            conversations,
            read_state,
        }
    }

    pub async fn handle(&self, query: GetUnreadCountQuery) -> Result<u64, MessagingError> {
        let user = query.user_id;
        let count = match query.conversation_id {
            Some(conversation_id) => {
                load_for_participant(self.conversations.as_ref(), &conversation_id, user).await?;
                retry_read("unread_for_conversation", || {
                    self.read_state.unread_for_conversation(&conversation_id, user)
                })
                .await?
            }
            None => {
                retry_read("unread_for_user", || self.read_state.unread_for_user(user)).await?
            }
        };
        Ok(count)
    }
}
