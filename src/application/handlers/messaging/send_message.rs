//! SendMessageHandler - Appends a message and refreshes the conversation summary.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::messaging::{Message, MessageDraft, MessagingError};
use crate::ports::{
    ConversationRepository, MessageRepository, ProfileDirectory, StoreError, UserProfile,
};

use super::retry::retry_read;

/// Command to send a message.
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub conversation_id: ConversationId,
    pub sender: UserId,
    pub content: String,
    /// Resubmitting with the same token returns the original message.
    pub client_token: Option<Uuid>,
}

/// Result of a successful send.
#[derive(Debug, Clone)]
pub struct SendMessageResult {
    pub message: Message,
    pub sender_profile: Option<UserProfile>,
    pub deduplicated: bool,
}

/// Handler for sending messages.
pub struct SendMessageHandler {
    conversations: Arc<dyn ConversationRepository>,
    messages: Arc<dyn MessageRepository>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl SendMessageHandler {
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

    pub async fn handle(
        &self,
        cmd: SendMessageCommand,
    ) -> Result<SendMessageResult, MessagingError> {
        let conversation = retry_read("find_conversation", || {
            self.conversations.find_by_id(&cmd.conversation_id)
        })
        .await?
        .ok_or(MessagingError::ConversationNotFound(cmd.conversation_id))?;

        let draft =
            MessageDraft::compose(&conversation, cmd.sender, &cmd.content, cmd.client_token)?;

        let appended = self.messages.append(&draft).await.map_err(|err| match err {
            StoreError::NotFound(_) => MessagingError::ConversationNotFound(cmd.conversation_id),
            other => {
                tracing::error!(
                    conversation_id = %cmd.conversation_id,
                    error = %other,
                    "message append failed"
                );
                other.into()
            }
        })?;

        if appended.deduplicated {
            tracing::debug!(
                message_id = %appended.message.id(),
                "client token matched an existing message"
            );
        } else {
            tracing::info!(
                conversation_id = %cmd.conversation_id,
                message_id = %appended.message.id(),
                sender_id = %cmd.sender,
                "message sent"
            );
        }

        let sender_profile = match self.profiles.profiles(&[cmd.sender]).await {
            Ok(mut profiles) => profiles.remove(&cmd.sender),
            Err(err) => {
                tracing::warn!(error = %err, "sender profile lookup failed");
                None
            }
        };

        Ok(SendMessageResult {
            message: appended.message,
            sender_profile,
            deduplicated: appended.deduplicated,
        })
    }
}
