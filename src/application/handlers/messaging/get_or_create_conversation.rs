//! GetOrCreateConversationHandler - Resolves the single conversation for a pair.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::messaging::{Conversation, MessagingError, ParticipantPair};
use crate::ports::{
    ConversationRepository, ProfileDirectory, ReadStateRepository, StoreError, UserDirectory,
    UserProfile,
};

use super::list_conversations::ConversationSummary;
use super::retry::retry_read;

/// Command to open a conversation with another user.
#[derive(Debug, Clone)]
pub struct GetOrCreateConversationCommand {
    pub requester: UserId,
    pub other_user: UserId,
}

/// Result of resolving a conversation, decorated for the requester the same
/// way an inbox row is.
#[derive(Debug, Clone)]
pub struct GetOrCreateConversationResult {
    pub conversation: Conversation,
    /// `true` only for the caller whose insert created the row.
    pub created: bool,
    pub other_participant: UserId,
    pub other_profile: Option<UserProfile>,
    pub unread_count: u64,
}

impl GetOrCreateConversationResult {
    pub fn into_summary(self) -> ConversationSummary {
        ConversationSummary {
            conversation: self.conversation,
            other_participant: self.other_participant,
            other_profile: self.other_profile,
            unread_count: self.unread_count,
        }
    }
}

/// Handler for get-or-create.
///
/// Lookup first, then insert; a duplicate-key rejection means another
/// request won the race, so the winner's row is fetched and returned.
pub struct GetOrCreateConversationHandler {
    conversations: Arc<dyn ConversationRepository>,
    read_state: Arc<dyn ReadStateRepository>,
    users: Arc<dyn UserDirectory>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl GetOrCreateConversationHandler {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        read_state: Arc<dyn ReadStateRepository>,
        users: Arc<dyn UserDirectory>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            conversations,
            read_state,
            users,
            profiles,
        }
    }

    pub async fn handle(
        &self,
        cmd: GetOrCreateConversationCommand,
    ) -> Result<GetOrCreateConversationResult, MessagingError> {
        let pair = ParticipantPair::new(cmd.requester, cmd.other_user)?;

        for user in [pair.low(), pair.high()] {
            let exists = retry_read("user_exists", || self.users.exists(user)).await?;
            if !exists {
                return Err(MessagingError::UserNotFound(user));
            }
        }

        let (conversation, created) = self.resolve(pair).await?;

        let unread_count = if created {
            0
        } else {
            retry_read("unread_for_conversation", || {
                self.read_state.unread_for_conversation(conversation.id(), cmd.requester)
            })
            .await?
        };

        Ok(GetOrCreateConversationResult {
            other_profile: self.other_profile(cmd.other_user).await,
            other_participant: cmd.other_user,
            unread_count,
            created,
            conversation,
        })
    }

    async fn resolve(&self, pair: ParticipantPair) -> Result<(Conversation, bool), MessagingError> {
        if let Some(conversation) = self.find(&pair).await? {
            return Ok((conversation, false));
        }

        let conversation = Conversation::start(pair);
        match self.conversations.insert(&conversation).await {
            Ok(()) => {
                tracing::info!(
                    conversation_id = %conversation.id(),
                    low = %pair.low(),
                    high = %pair.high(),
                    "conversation created"
                );
                Ok((conversation, true))
            }
            Err(StoreError::UniqueViolation(_)) => {
                tracing::debug!(
                    low = %pair.low(),
                    high = %pair.high(),
                    "lost creation race, refetching"
                );
                match self.find(&pair).await? {
                    Some(conversation) => Ok((conversation, false)),
                    None => Err(MessagingError::conflict(format!(
                        "conversation for ({}, {}) was reported as existing but could not be read",
                        pair.low(),
                        pair.high()
                    ))),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find(&self, pair: &ParticipantPair) -> Result<Option<Conversation>, StoreError> {
        retry_read("find_conversation_by_pair", || {
            self.conversations.find_by_pair(pair)
        })
        .await
    }

    async fn other_profile(&self, other: UserId) -> Option<UserProfile> {
        let ids = [other];
        match retry_read("profiles", || self.profiles.profiles(&ids)).await {
            Ok(mut profiles) => profiles.remove(&other),
            Err(err) => {
                tracing::warn!(error = %err, "profile lookup failed, returning bare conversation");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryMessagingStore, InMemoryUserDirectory};
    use crate::domain::foundation::ConversationId;
    use crate::domain::messaging::MessageDraft;
    use crate::ports::MessageRepository;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn user(id: i64) -> UserId {
        UserId::from_i64(id)
    }

    fn directory(ids: &[i64]) -> Arc<InMemoryUserDirectory> {
        Arc::new(InMemoryUserDirectory::with_profiles(
            ids.iter()
                .map(|id| UserProfile::new(user(*id), format!("user{}", id))),
        ))
    }

    fn handler_over(
        store: Arc<InMemoryMessagingStore>,
        users: &[i64],
    ) -> GetOrCreateConversationHandler {
        let directory = directory(users);
        GetOrCreateConversationHandler::new(store.clone(), store, directory.clone(), directory)
    }

    fn racing_handler(repo: Arc<RacingConversationRepository>) -> GetOrCreateConversationHandler {
        let directory = directory(&[1, 2]);
        GetOrCreateConversationHandler::new(
            repo,
            Arc::new(InMemoryMessagingStore::new()),
            directory.clone(),
            directory,
        )
    }

    fn command(requester: i64, other: i64) -> GetOrCreateConversationCommand {
        GetOrCreateConversationCommand {
            requester: user(requester),
            other_user: user(other),
        }
    }

    /// Simulates losing the insert race: the first lookup misses, the insert
    /// hits the unique constraint, and later lookups see `winner`.
    struct RacingConversationRepository {
        winner: Option<Conversation>,
        lookups: Mutex<u32>,
    }

    #[async_trait]
    impl ConversationRepository for RacingConversationRepository {
        async fn find_by_id(
            &self,
            _id: &ConversationId,
        ) -> Result<Option<Conversation>, StoreError> {
            Ok(None)
        }

        async fn find_by_pair(
            &self,
            _pair: &ParticipantPair,
        ) -> Result<Option<Conversation>, StoreError> {
            let mut lookups = self.lookups.lock().unwrap();
            *lookups += 1;
            if *lookups == 1 {
                Ok(None)
            } else {
                Ok(self.winner.clone())
            }
        }

        async fn insert(&self, _conversation: &Conversation) -> Result<(), StoreError> {
            Err(StoreError::UniqueViolation("pair".into()))
        }

        async fn list_for_user(&self, _user: UserId) -> Result<Vec<Conversation>, StoreError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn creates_conversation_on_first_contact() {
        let store = Arc::new(InMemoryMessagingStore::new());
        let handler = handler_over(store.clone(), &[1, 2]);

        let result = handler.handle(command(2, 1)).await.unwrap();

        assert!(result.created);
        assert_eq!(result.conversation.pair().low(), user(1));
        assert_eq!(result.conversation.pair().high(), user(2));
        assert_eq!(store.conversation_count().await, 1);
    }

    #[tokio::test]
    async fn is_commutative_and_idempotent() {
        let store = Arc::new(InMemoryMessagingStore::new());
        let handler = handler_over(store.clone(), &[1, 2]);

        let first = handler.handle(command(1, 2)).await.unwrap();
        let second = handler.handle(command(2, 1)).await.unwrap();

        assert!(!second.created);
        assert_eq!(first.conversation.id(), second.conversation.id());
        assert_eq!(store.conversation_count().await, 1);
    }

    #[tokio::test]
    async fn rejects_self_conversation() {
        let store = Arc::new(InMemoryMessagingStore::new());
        let handler = handler_over(store, &[1]);

        let err = handler.handle(command(1, 1)).await.unwrap_err();
        assert!(matches!(err, MessagingError::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = Arc::new(InMemoryMessagingStore::new());
        let handler = handler_over(store.clone(), &[1]);

        let err = handler.handle(command(1, 99)).await.unwrap_err();
        assert_eq!(err, MessagingError::UserNotFound(user(99)));
        assert_eq!(store.conversation_count().await, 0);
    }

    #[tokio::test]
    async fn lost_race_returns_winner() {
        let winner = Conversation::start(ParticipantPair::new(user(1), user(2)).unwrap());
        let repo = Arc::new(RacingConversationRepository {
            winner: Some(winner.clone()),
            lookups: Mutex::new(0),
        });
        let handler = racing_handler(repo);

        let result = handler.handle(command(1, 2)).await.unwrap();
        assert!(!result.created);
        assert_eq!(result.conversation.id(), winner.id());
    }

    #[tokio::test]
    async fn unresolvable_race_is_conflict() {
        let repo = Arc::new(RacingConversationRepository {
            winner: None,
            lookups: Mutex::new(0),
        });
        let handler = racing_handler(repo);

        let err = handler.handle(command(1, 2)).await.unwrap_err();
        assert!(matches!(err, MessagingError::Conflict(_)));
    }

    #[tokio::test]
    async fn transient_lookup_failure_is_retried() {
        let store = Arc::new(InMemoryMessagingStore::new());
        let handler = handler_over(store.clone(), &[1, 2]);
        store.fail_next_reads(1).await;

        let result = handler.handle(command(1, 2)).await.unwrap();
        assert!(result.created);
    }

    #[tokio::test]
    async fn failed_insert_reports_unchanged_state() {
        let store = Arc::new(InMemoryMessagingStore::new());
        let handler = handler_over(store.clone(), &[1, 2]);
        store.fail_next_write(StoreError::unavailable("pool timed out")).await;

        let err = handler.handle(command(1, 2)).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store.conversation_count().await, 0);
    }

    #[tokio::test]
    async fn reopening_reports_unread_and_profile() {
        let store = Arc::new(InMemoryMessagingStore::new());
        let handler = handler_over(store.clone(), &[1, 2]);
        let opened = handler.handle(command(1, 2)).await.unwrap();
        assert_eq!(opened.unread_count, 0);

        for content in ["one", "two"] {
            let draft =
                MessageDraft::compose(&opened.conversation, user(2), content, None).unwrap();
            store.append(&draft).await.unwrap();
        }

        let reopened = handler.handle(command(1, 2)).await.unwrap();
        assert!(!reopened.created);
        assert_eq!(reopened.unread_count, 2);
        assert_eq!(reopened.other_participant, user(2));
        assert_eq!(reopened.other_profile.unwrap().display_name, "user2");

        let from_sender = handler.handle(command(2, 1)).await.unwrap();
        assert_eq!(from_sender.unread_count, 0);
    }
}
