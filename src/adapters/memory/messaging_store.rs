//! In-memory messaging store for tests and single-process development.
//!
//! Implements all three store ports over one shared state guarded by a
//! single lock, which gives every operation the same atomicity the
//! PostgreSQL adapter gets from its transactions: one append at a time
//! per store, a unique participant pair, dedup by client token, and a
//! total `(created_at, sequence)` order.
//!
//! Failures can be injected to exercise retry and reconciliation paths.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId};
use crate::domain::messaging::{Conversation, Message, MessageDraft, ParticipantPair};
use crate::ports::{
    AppendResult, ConversationRepository, MessageRepository, ReadStateRepository,
    SnapshotPolicy, StoreError,
};

#[derive(Debug, Default)]
struct State {
    conversations: HashMap<ConversationId, Conversation>,
    by_pair: HashMap<ParticipantPair, ConversationId>,
    messages: HashMap<MessageId, Message>,
    last_sequence: i64,
}

impl State {
    fn conversation_messages<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> impl Iterator<Item = &'a Message> + 'a {
        self.messages
            .values()
            .filter(move |m| m.conversation_id() == conversation_id)
    }

    fn newest_in(&self, conversation_id: &ConversationId) -> Option<Message> {
        self.conversation_messages(conversation_id)
            .max_by_key(|m| m.ordering_key())
            .cloned()
    }
}

#[derive(Debug, Default)]
struct Faults {
    reads: u32,
    writes: VecDeque<StoreError>,
}

/// In-memory implementation of the messaging store ports.
///
/// Cloning yields another handle onto the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessagingStore {
    state: Arc<RwLock<State>>,
    faults: Arc<Mutex<Faults>>,
}

impl InMemoryMessagingStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Make the next `count` reads fail with `StoreError::Unavailable`.
    pub async fn fail_next_reads(&self, count: u32) {
        self.faults.lock().await.reads = count;
    }

    /// Queue a failure for the next write.
    ///
    /// `CommitUncertain` is applied after the write lands, mirroring a
    /// connection lost while the commit was in flight. Every other error
    /// leaves state untouched.
    pub async fn fail_next_write(&self, error: StoreError) {
        self.faults.lock().await.writes.push_back(error);
    }

    /// Number of stored conversations.
    pub async fn conversation_count(&self) -> usize {
        self.state.read().await.conversations.len()
    }

    /// Number of stored messages across all conversations.
    pub async fn message_count(&self) -> usize {
        self.state.read().await.messages.len()
    }

    async fn check_read(&self) -> Result<(), StoreError> {
        let mut faults = self.faults.lock().await;
        if faults.reads > 0 {
            faults.reads -= 1;
            return Err(StoreError::unavailable("injected read failure"));
        }
        Ok(())
    }

    /// Returns the queued failure, if any, split by whether it happens
    /// before or after the write is applied.
    async fn take_write_fault(&self) -> (Option<StoreError>, Option<StoreError>) {
        match self.faults.lock().await.writes.pop_front() {
            Some(err @ StoreError::CommitUncertain(_)) => (None, Some(err)),
            Some(err) => (Some(err), None),
            None => (None, None),
        }
    }
}

#[async_trait]
impl ConversationRepository for InMemoryMessagingStore {
    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        self.check_read().await?;
        Ok(self.state.read().await.conversations.get(id).cloned())
    }

    async fn find_by_pair(
        &self,
        pair: &ParticipantPair,
    ) -> Result<Option<Conversation>, StoreError> {
        self.check_read().await?;
        let state = self.state.read().await;
        Ok(state
            .by_pair
            .get(pair)
            .and_then(|id| state.conversations.get(id))
            .cloned())
    }

    async fn insert(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let (before, after) = self.take_write_fault().await;
        if let Some(err) = before {
            return Err(err);
        }

        let mut state = self.state.write().await;
        if state.by_pair.contains_key(conversation.pair()) {
            return Err(StoreError::UniqueViolation(format!(
                "conversation already exists for pair ({}, {})",
                conversation.pair().low(),
                conversation.pair().high()
            )));
        }
        state
            .by_pair
            .insert(*conversation.pair(), *conversation.id());
        state
            .conversations
            .insert(*conversation.id(), conversation.clone());

        after.map_or(Ok(()), Err)
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Conversation>, StoreError> {
        self.check_read().await?;
        let state = self.state.read().await;
        let mut conversations: Vec<Conversation> = state
            .conversations
            .values()
            .filter(|c| c.is_participant(user))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.updated_at().cmp(a.updated_at()));
        Ok(conversations)
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessagingStore {
    async fn append(&self, draft: &MessageDraft) -> Result<AppendResult, StoreError> {
        let (before, after) = self.take_write_fault().await;
        if let Some(err) = before {
            return Err(err);
        }

        let mut state = self.state.write().await;
        let mut conversation = state
            .conversations
            .get(draft.conversation_id())
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound(format!("conversation {}", draft.conversation_id()))
            })?;

        if let Some(token) = draft.client_token() {
            let existing = state
                .conversation_messages(draft.conversation_id())
                .find(|m| m.sender_id() == draft.sender_id() && m.client_token() == Some(token))
                .cloned();
            if let Some(message) = existing {
                return Ok(AppendResult {
                    message,
                    conversation,
                    deduplicated: true,
                });
            }
        }

        state.last_sequence += 1;
        let created_at = conversation.next_message_time(Timestamp::now());
        let message =
            Message::from_draft(draft.clone(), MessageId::new(), state.last_sequence, created_at);
        conversation.record_message(&message);

        state.messages.insert(*message.id(), message.clone());
        state
            .conversations
            .insert(*conversation.id(), conversation.clone());

        if let Some(err) = after {
            return Err(err);
        }
        Ok(AppendResult {
            message,
            conversation,
            deduplicated: false,
        })
    }

    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, StoreError> {
        self.check_read().await?;
        Ok(self.state.read().await.messages.get(id).cloned())
    }

    async fn delete(&self, id: &MessageId, policy: SnapshotPolicy) -> Result<bool, StoreError> {
        let (before, after) = self.take_write_fault().await;
        if let Some(err) = before {
            return Err(err);
        }

        let mut state = self.state.write().await;
        let removed = match state.messages.remove(id) {
            Some(message) => message,
            None => return Ok(false),
        };

        if policy == SnapshotPolicy::Recompute {
            let newest = state.newest_in(removed.conversation_id());
            if let Some(conversation) = state.conversations.get_mut(removed.conversation_id()) {
                conversation.replace_snapshot(newest.as_ref());
            }
        }

        after.map_or(Ok(true), Err)
    }

    async fn newest_first(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Message>, StoreError> {
        self.check_read().await?;
        let state = self.state.read().await;
        let mut messages: Vec<Message> =
            state.conversation_messages(conversation_id).cloned().collect();
        messages.sort_by_key(|m| std::cmp::Reverse(m.ordering_key()));
        Ok(messages
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect())
    }
}

#[async_trait]
impl ReadStateRepository for InMemoryMessagingStore {
    async fn mark_read(&self, id: &MessageId, reader: UserId) -> Result<bool, StoreError> {
        let (before, after) = self.take_write_fault().await;
        if let Some(err) = before {
            return Err(err);
        }

        let mut state = self.state.write().await;
        let changed = state
            .messages
            .get_mut(id)
            .map(|m| matches!(m.mark_read(reader), Ok(true)))
            .unwrap_or(false);

        after.map_or(Ok(changed), Err)
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: &ConversationId,
        reader: UserId,
    ) -> Result<u64, StoreError> {
        let (before, after) = self.take_write_fault().await;
        if let Some(err) = before {
            return Err(err);
        }

        let mut state = self.state.write().await;
        let mut changed = 0;
        for message in state.messages.values_mut() {
            if message.conversation_id() == conversation_id
                && matches!(message.mark_read(reader), Ok(true))
            {
                changed += 1;
            }
        }

        after.map_or(Ok(changed), Err)
    }

    async fn unread_for_user(&self, user: UserId) -> Result<u64, StoreError> {
        self.check_read().await?;
        let state = self.state.read().await;
        Ok(state
            .messages
            .values()
            .filter(|m| m.receiver_id() == user && !m.is_read())
            .count() as u64)
    }

    async fn unread_for_conversation(
        &self,
        conversation_id: &ConversationId,
        user: UserId,
    ) -> Result<u64, StoreError> {
        self.check_read().await?;
        let state = self.state.read().await;
        Ok(state
            .conversation_messages(conversation_id)
            .filter(|m| m.receiver_id() == user && !m.is_read())
            .count() as u64)
    }

    async fn unread_counts_by_conversation(
        &self,
        user: UserId,
    ) -> Result<HashMap<ConversationId, u64>, StoreError> {
        self.check_read().await?;
        let state = self.state.read().await;
        let mut counts = HashMap::new();
        for message in state.messages.values() {
            if message.receiver_id() == user && !message.is_read() {
                *counts.entry(*message.conversation_id()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> UserId {
        UserId::from_i64(id)
    }

    async fn store_with_conversation() -> (InMemoryMessagingStore, Conversation) {
        let store = InMemoryMessagingStore::new();
        let conv = Conversation::start(ParticipantPair::new(user(1), user(2)).unwrap());
        store.insert(&conv).await.unwrap();
        (store, conv)
    }

    async fn send(
        store: &InMemoryMessagingStore,
        conv: &Conversation,
        from: i64,
        text: &str,
    ) -> Message {
        let draft = MessageDraft::compose(conv, user(from), text, None).unwrap();
        store.append(&draft).await.unwrap().message
    }

    #[tokio::test]
    async fn duplicate_pair_is_rejected() {
        let (store, _) = store_with_conversation().await;
        let again = Conversation::start(ParticipantPair::new(user(2), user(1)).unwrap());
        let err = store.insert(&again).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
        assert_eq!(store.conversation_count().await, 1);
    }

    #[tokio::test]
    async fn append_updates_snapshot_and_sequence() {
        let (store, conv) = store_with_conversation().await;
        let first = send(&store, &conv, 1, "one").await;
        let second = send(&store, &conv, 2, "two").await;

        assert!(second.sequence() > first.sequence());
        assert!(second.created_at().is_after(first.created_at()));

        let stored = ConversationRepository::find_by_id(&store, conv.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.last_message().unwrap().content, "two");
        assert_eq!(stored.updated_at(), second.created_at());
    }

    #[tokio::test]
    async fn append_to_missing_conversation_fails() {
        let store = InMemoryMessagingStore::new();
        let conv = Conversation::start(ParticipantPair::new(user(1), user(2)).unwrap());
        let draft = MessageDraft::compose(&conv, user(1), "hi", None).unwrap();
        let err = store.append(&draft).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn same_client_token_is_deduplicated() {
        let (store, conv) = store_with_conversation().await;
        let token = uuid::Uuid::new_v4();
        let draft = MessageDraft::compose(&conv, user(1), "once", Some(token)).unwrap();

        let first = store.append(&draft).await.unwrap();
        let second = store.append(&draft).await.unwrap();

        assert!(!first.deduplicated);
        assert!(second.deduplicated);
        assert_eq!(first.message.id(), second.message.id());
        assert_eq!(store.message_count().await, 1);
    }

    #[tokio::test]
    async fn newest_first_orders_and_windows() {
        let (store, conv) = store_with_conversation().await;
        for i in 0..5 {
            send(&store, &conv, 1, &format!("m{}", i)).await;
        }
        let window = store.newest_first(conv.id(), 2, 1).await.unwrap();
        let contents: Vec<&str> = window.iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["m3", "m2"]);
    }

    #[tokio::test]
    async fn delete_keeps_snapshot_by_default() {
        let (store, conv) = store_with_conversation().await;
        send(&store, &conv, 1, "first").await;
        let last = send(&store, &conv, 1, "last").await;

        assert!(store.delete(last.id(), SnapshotPolicy::Keep).await.unwrap());
        let stored = ConversationRepository::find_by_id(&store, conv.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.last_message().unwrap().content, "last");
    }

    #[tokio::test]
    async fn delete_can_recompute_snapshot() {
        let (store, conv) = store_with_conversation().await;
        send(&store, &conv, 1, "first").await;
        let last = send(&store, &conv, 1, "last").await;

        store.delete(last.id(), SnapshotPolicy::Recompute).await.unwrap();
        let stored = ConversationRepository::find_by_id(&store, conv.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.last_message().unwrap().content, "first");
        assert_eq!(stored.updated_at(), last.created_at());
    }

    #[tokio::test]
    async fn deleting_missing_message_reports_false() {
        let store = InMemoryMessagingStore::new();
        let deleted = store.delete(&MessageId::new(), SnapshotPolicy::Keep).await.unwrap();
        assert!(!deleted);
    }

    #[tokio::test]
    async fn mark_read_only_for_receiver() {
        let (store, conv) = store_with_conversation().await;
        let message = send(&store, &conv, 1, "hello").await;

        assert!(!store.mark_read(message.id(), user(1)).await.unwrap());
        assert!(store.mark_read(message.id(), user(2)).await.unwrap());
        assert!(!store.mark_read(message.id(), user(2)).await.unwrap());
    }

    #[tokio::test]
    async fn conversation_read_only_touches_reader() {
        let (store, conv) = store_with_conversation().await;
        send(&store, &conv, 1, "a").await;
        send(&store, &conv, 1, "b").await;
        send(&store, &conv, 2, "c").await;

        assert_eq!(store.mark_conversation_read(conv.id(), user(2)).await.unwrap(), 2);
        assert_eq!(store.unread_for_user(user(2)).await.unwrap(), 0);
        assert_eq!(store.unread_for_user(user(1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_is_ordered_by_activity() {
        let (store, older) = store_with_conversation().await;
        let newer = Conversation::start(ParticipantPair::new(user(1), user(3)).unwrap());
        store.insert(&newer).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        send(&store, &older, 2, "bump").await;

        let list = store.list_for_user(user(1)).await.unwrap();
        assert_eq!(list[0].id(), older.id());
        assert_eq!(list[1].id(), newer.id());
    }

    #[tokio::test]
    async fn injected_read_failures_are_consumed() {
        let (store, conv) = store_with_conversation().await;
        store.fail_next_reads(1).await;
        assert!(ConversationRepository::find_by_id(&store, conv.id()).await.is_err());
        assert!(ConversationRepository::find_by_id(&store, conv.id()).await.is_ok());
    }

    #[tokio::test]
    async fn uncertain_commit_still_applies_write() {
        let (store, conv) = store_with_conversation().await;
        store
            .fail_next_write(StoreError::CommitUncertain("lost connection".into()))
            .await;
        let draft = MessageDraft::compose(&conv, user(1), "maybe", None).unwrap();
        assert!(store.append(&draft).await.is_err());
        assert_eq!(store.message_count().await, 1);
    }

    #[tokio::test]
    async fn failure_before_write_changes_nothing() {
        let (store, conv) = store_with_conversation().await;
        store.fail_next_write(StoreError::unavailable("pool timed out")).await;
        let draft = MessageDraft::compose(&conv, user(1), "nope", None).unwrap();
        assert!(store.append(&draft).await.is_err());
        assert_eq!(store.message_count().await, 0);
    }
}
