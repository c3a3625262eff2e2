//! MarkMessageReadHandler - Receiver flips a single read flag.

use std::sync::Arc;

use crate::domain::foundation::{MessageId, UserId};
use crate::domain::messaging::MessagingError;
use crate::ports::{MessageRepository, ReadStateRepository};

use super::retry::retry_read;

/// Command to mark one message read.
#[derive(Debug, Clone)]
pub struct MarkMessageReadCommand {
    pub message_id: MessageId,
    pub reader: UserId,
}

/// Handler for marking a message read. Idempotent.
pub struct MarkMessageReadHandler {
    messages: Arc<dyn MessageRepository>,
    read_state: Arc<dyn ReadStateRepository>,
}

impl MarkMessageReadHandler {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        read_state: Arc<dyn ReadStateRepository>,
    ) -> Self {
        Self {
            messages,
            read_state,
        }
    }

    /// Returns `true` if this call flipped the flag.
    pub async fn handle(&self, cmd: MarkMessageReadCommand) -> Result<bool, MessagingError> {
        let mut message = retry_read("find_message", || self.messages.find_by_id(&cmd.message_id))
            .await?
            .ok_or(MessagingError::MessageNotFound(cmd.message_id))?;

        if !message.mark_read(cmd.reader)? {
            return Ok(false);
        }

        Ok(self.read_state.mark_read(&cmd.message_id, cmd.reader).await?)
    }
}
