//! DeleteMessageHandler - Sender-only hard delete.

use std::sync::Arc;

use crate::domain::foundation::{MessageId, UserId};
use crate::domain::messaging::MessagingError;
use crate::ports::{MessageRepository, SnapshotPolicy};

use super::retry::retry_read;

/// Command to delete a message.
#[derive(Debug, Clone)]
pub struct DeleteMessageCommand {
    pub message_id: MessageId,
    pub requester: UserId,
}

/// Handler for deleting messages.
///
/// The conversation summary is left as-is unless the handler was built
/// with [`SnapshotPolicy::Recompute`].
pub struct DeleteMessageHandler {
    messages: Arc<dyn MessageRepository>,
    policy: SnapshotPolicy,
}

impl DeleteMessageHandler {
    pub fn new(messages: Arc<dyn MessageRepository>, policy: SnapshotPolicy) -> Self {
        Self { messages, policy }
    }

    pub async fn handle(&self, cmd: DeleteMessageCommand) -> Result<(), MessagingError> {
        let message = retry_read("find_message", || self.messages.find_by_id(&cmd.message_id))
            .await?
            .ok_or(MessagingError::MessageNotFound(cmd.message_id))?;

        message.authorize_delete(cmd.requester)?;

        if !self.messages.delete(&cmd.message_id, self.policy).await? {
            return Err(MessagingError::MessageNotFound(cmd.message_id));
        }

        tracing::info!(
            message_id = %cmd.message_id,
            conversation_id = %message.conversation_id(),
            policy = ?self.policy,
            "message deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryMessagingStore;
    use crate::domain::messaging::{Conversation, Message, MessageDraft, ParticipantPair};
    use crate::ports::ConversationRepository;

    fn user(id: i64) -> UserId {
        UserId::from_i64(id)
    }

    async fn seeded(store: &InMemoryMessagingStore) -> (Conversation, Message, Message) {
        let conversation = Conversation::start(ParticipantPair::new(user(1), user(2)).unwrap());
        store.insert(&conversation).await.unwrap();
        let first = MessageDraft::compose(&conversation, user(2), "first", None).unwrap();
        let first = store.append(&first).await.unwrap().message;
        let last = MessageDraft::compose(&conversation, user(1), "last", None).unwrap();
        let last = store.append(&last).await.unwrap().message;
        (conversation, first, last)
    }

    async fn snapshot_content(
        store: &InMemoryMessagingStore,
        conversation: &Conversation,
    ) -> String {
        ConversationRepository::find_by_id(store, conversation.id())
            .await
            .unwrap()
            .unwrap()
            .last_message()
            .map(|s| s.content.clone())
            .unwrap_or_default()
    }

    fn command(message: &Message, requester: i64) -> DeleteMessageCommand {
        DeleteMessageCommand {
            message_id: *message.id(),
            requester: user(requester),
        }
    }

    #[tokio::test]
    async fn sender_deletes_own_message() {
        let store = Arc::new(InMemoryMessagingStore::new());
        let (_, _, last) = seeded(&store).await;
        let handler = DeleteMessageHandler::new(store.clone(), SnapshotPolicy::Keep);

        handler.handle(command(&last, 1)).await.unwrap();

        assert_eq!(store.message_count().await, 1);
        assert!(MessageRepository::find_by_id(store.as_ref(), last.id())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn receiver_cannot_delete() {
        let store = Arc::new(InMemoryMessagingStore::new());
        let (_, _, last) = seeded(&store).await;
        let handler = DeleteMessageHandler::new(store.clone(), SnapshotPolicy::Keep);

        let err = handler.handle(command(&last, 2)).await.unwrap_err();

        assert!(matches!(err, MessagingError::Forbidden(_)));
        assert_eq!(store.message_count().await, 2);
    }

    #[tokio::test]
    async fn unknown_message_is_not_found() {
        let store = Arc::new(InMemoryMessagingStore::new());
        let handler = DeleteMessageHandler::new(store, SnapshotPolicy::Keep);

        let err = handler
            .handle(DeleteMessageCommand {
                message_id: MessageId::new(),
                requester: user(1),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::MessageNotFound(_)));
    }

    #[tokio::test]
    async fn keep_policy_leaves_stale_snapshot() {
        let store = Arc::new(InMemoryMessagingStore::new());
        let (conversation, _, last) = seeded(&store).await;
        let handler = DeleteMessageHandler::new(store.clone(), SnapshotPolicy::Keep);

        handler.handle(command(&last, 1)).await.unwrap();
        assert_eq!(snapshot_content(&store, &conversation).await, "last");
    }

    #[tokio::test]
    async fn recompute_policy_restores_previous_message() {
        let store = Arc::new(InMemoryMessagingStore::new());
        let (conversation, _, last) = seeded(&store).await;
        let handler = DeleteMessageHandler::new(store.clone(), SnapshotPolicy::Recompute);

        handler.handle(command(&last, 1)).await.unwrap();
        assert_eq!(snapshot_content(&store, &conversation).await, "first");
    }
}
