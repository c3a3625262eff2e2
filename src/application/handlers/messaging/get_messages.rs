//! GetMessagesHandler - Paged, chronologically ordered history.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::messaging::{MessagePage, MessagingError, PageRequest};
use crate::ports::{ConversationRepository, MessageRepository, ProfileDirectory, UserProfile};

use super::access::load_for_participant;
use super::retry::retry_read;

/// Query for one page of a conversation's history.
#[derive(Debug, Clone)]
pub struct GetMessagesQuery {
    pub conversation_id: ConversationId,
    pub requester: UserId,
    /// 1-based; page 1 holds the newest messages.
    pub page: u32,
    pub page_size: u32,
}

/// One page plus display metadata for both participants.
#[derive(Debug, Clone)]
pub struct MessageHistory {
    pub page: MessagePage,
    pub profiles: HashMap<UserId, UserProfile>,
}

/// Handler for paging through messages.
pub struct GetMessagesHandler {
    conversations: Arc<dyn ConversationRepository>,
    messages: Arc<dyn MessageRepository>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl GetMessagesHandler {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        messages: Arc<dyn MessageRepository>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            conversations,
            messages,
            profiles,
        }
    }

    pub async fn handle(&self, query: GetMessagesQuery) -> Result<MessageHistory, MessagingError> {
        let request = PageRequest::new(query.page, query.page_size)?;
        let conversation = load_for_participant(
            self.conversations.as_ref(),
            &query.conversation_id,
            query.requester,
        )
        .await?;

        let newest_first = retry_read("page_messages", || {
            self.messages.newest_first(
                &query.conversation_id,
                request.page_size(),
                request.offset(),
            )
        })
        .await?;
        let page = MessagePage::from_newest_first(newest_first, request);

        let participants = [conversation.pair().low(), conversation.pair().high()];
        let profiles = match retry_read("profiles", || self.profiles.profiles(&participants)).await
        {
            Ok(profiles) => profiles,
            Err(err) => {
                tracing::warn!(error = %err, "profile lookup failed, returning undecorated page");
                HashMap::new()
            }
        };

        Ok(MessageHistory { page, profiles })
    }
}
