//! MarkConversationReadHandler - Bulk read for everything addressed to the reader.

use std::sync::Arc;

use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::messaging::MessagingError;
use crate::ports::{ConversationRepository, ReadStateRepository};

use super::access::load_for_participant;

/// Command to mark a whole conversation read.
#[derive(Debug, Clone)]
pub struct MarkConversationReadCommand {
    pub conversation_id: ConversationId,
    pub reader: UserId,
}

/// Handler for bulk read marking.
pub struct MarkConversationReadHandler {
    conversations: Arc<dyn ConversationRepository>,
    read_state: Arc<dyn ReadStateRepository>,
}

impl MarkConversationReadHandler {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        read_state: Arc<dyn ReadStateRepository>,
    ) -> Self {
        Self {
            conversations,
            read_state,
        }
    }

    /// Returns how many messages changed state.
    pub async fn handle(&self, cmd: MarkConversationReadCommand) -> Result<u64, MessagingError> {
        load_for_participant(self.conversations.as_ref(), &cmd.conversation_id, cmd.reader)
            .await?;

        let updated = self
            .read_state
            .mark_conversation_read(&cmd.conversation_id, cmd.reader)
            .await?;

        tracing::debug!(
            conversation_id = %cmd.conversation_id,
            reader_id = %cmd.reader,
            updated,
            "conversation marked read"
        );
        Ok(updated)
    }
}
