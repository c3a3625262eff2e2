//! ListConversationsHandler - Query handler for a user's inbox.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::messaging::{Conversation, MessagingError};
use crate::ports::{ConversationRepository, ProfileDirectory, ReadStateRepository, UserProfile};

use super::retry::retry_read;

/// Query to list conversations for a user.
#[derive(Debug, Clone)]
pub struct ListConversationsQuery {
    pub user_id: UserId,
}

/// One inbox row, decorated for the viewing user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub other_participant: UserId,
    pub other_profile: Option<UserProfile>,
    pub unread_count: u64,
}

/// Handler for listing conversations, most recently active first.
pub struct ListConversationsHandler {
    conversations: Arc<dyn ConversationRepository>,
    read_state: Arc<dyn ReadStateRepository>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl ListConversationsHandler {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        read_state: Arc<dyn ReadStateRepository>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            conversations,
            read_state,
            profiles,
        }
    }

    pub async fn handle(
        &self,
        query: ListConversationsQuery,
    ) -> Result<Vec<ConversationSummary>, MessagingError> {
        let user = query.user_id;
        let (conversations, unread) = futures::try_join!(
            retry_read("list_conversations", || self.conversations.list_for_user(user)),
            retry_read("unread_counts", || self
                .read_state
                .unread_counts_by_conversation(user)),
        )?;

        let others: Vec<UserId> = conversations
            .iter()
            .filter_map(|c| c.pair().other(user))
            .collect();
        let profiles = self.lookup_profiles(&others).await;

        Ok(conversations
            .into_iter()
            .filter_map(|conversation| {
                let other = conversation.pair().other(user)?;
                let unread_count = unread.get(conversation.id()).copied().unwrap_or(0);
                Some(ConversationSummary {
                    other_profile: profiles.get(&other).cloned(),
                    other_participant: other,
                    unread_count,
                    conversation,
                })
            })
            .collect())
    }

    /// Profiles only decorate the list; a directory outage degrades to
    /// undecorated rows.
    async fn lookup_profiles(&self, ids: &[UserId]) -> HashMap<UserId, UserProfile> {
        if ids.is_empty() {
            return HashMap::new();
        }
        match retry_read("profiles", || self.profiles.profiles(ids)).await {
            Ok(profiles) => profiles,
            Err(err) => {
                tracing::warn!(error = %err, "profile lookup failed, listing without profiles");
                HashMap::new()
            }
        }
    }
}
