//! Participant checks shared by conversation-scoped handlers.

use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::messaging::{Conversation, MessagingError};
use crate::ports::ConversationRepository;

use super::retry::retry_read;

/// Load a conversation and ensure `user` takes part in it.
pub(crate) async fn load_for_participant(
    conversations: &dyn ConversationRepository,
    id: &ConversationId,
    user: UserId,
) -> Result<Conversation, MessagingError> {
    let conversation = retry_read("find_conversation", || conversations.find_by_id(id))
        .await?
        .ok_or(MessagingError::ConversationNotFound(*id))?;
    conversation.authorize(user)?;
    Ok(conversation)
}
