//! PostgreSQL implementation of MessageRepository.
//!
//! Appends lock the conversation row (`SELECT ... FOR UPDATE`) so that
//! concurrent sends to one conversation serialize, then insert the message
//! and rewrite the conversation summary inside the same transaction.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::foundation::{ConversationId, MessageId, Timestamp};
use crate::domain::messaging::{Conversation, Message, MessageDraft};
use crate::ports::{AppendResult, MessageRepository, SnapshotPolicy, StoreError};

use super::errors::{commit_error, store_error};
use super::rows::{conversation_from_row, message_from_row, CONVERSATION_COLUMNS, MESSAGE_COLUMNS};

/// PostgreSQL implementation of MessageRepository.
#[derive(Clone)]
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_conversation(
        tx: &mut Transaction<'_, Postgres>,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        let sql = format!(
            "SELECT {} FROM conversations WHERE id = $1 FOR UPDATE",
            CONVERSATION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| store_error("lock conversation", e))?;

        row.as_ref().map(conversation_from_row).transpose()
    }

    async fn write_snapshot(
        tx: &mut Transaction<'_, Postgres>,
        conversation: &Conversation,
    ) -> Result<(), StoreError> {
        let snapshot = conversation.last_message();
        sqlx::query(
            r#"
            UPDATE conversations SET
                last_message_content = $2,
                last_message_at = $3,
                last_message_sender_id = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(conversation.id().as_uuid())
        .bind(snapshot.map(|s| s.content.clone()))
        .bind(snapshot.map(|s| *s.created_at.as_datetime()))
        .bind(snapshot.map(|s| s.sender_id.as_i64()))
        .bind(conversation.updated_at().as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| store_error("update conversation summary", e))?;

        Ok(())
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn append(&self, draft: &MessageDraft) -> Result<AppendResult, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("begin transaction", e))?;

        let mut conversation = Self::lock_conversation(&mut tx, draft.conversation_id())
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(format!("conversation {}", draft.conversation_id()))
            })?;

        if let Some(token) = draft.client_token() {
            let sql = format!(
                r#"
                SELECT {} FROM messages
                WHERE conversation_id = $1 AND sender_id = $2 AND client_token = $3
                "#,
                MESSAGE_COLUMNS
            );
            let existing = sqlx::query(&sql)
                .bind(draft.conversation_id().as_uuid())
                .bind(draft.sender_id().as_i64())
                .bind(token)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| store_error("lookup client token", e))?;

            if let Some(row) = existing {
                let message = message_from_row(&row)?;
                tx.commit().await.map_err(commit_error)?;
                return Ok(AppendResult {
                    message,
                    conversation,
                    deduplicated: true,
                });
            }
        }

        let id = MessageId::new();
        let created_at = conversation.next_message_time(Timestamp::now());

        let row = sqlx::query(
            r#"
            INSERT INTO messages (
                id, conversation_id, sender_id, receiver_id, content,
                created_at, is_read, client_token
            ) VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)
            RETURNING sequence
            "#,
        )
        .bind(id.as_uuid())
        .bind(draft.conversation_id().as_uuid())
        .bind(draft.sender_id().as_i64())
        .bind(draft.receiver_id().as_i64())
        .bind(draft.content())
        .bind(created_at.as_datetime())
        .bind(draft.client_token())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| store_error("insert message", e))?;

        let sequence: i64 = row
            .try_get("sequence")
            .map_err(|e| StoreError::database(format!("decode sequence: {}", e)))?;

        let message = Message::from_draft(draft.clone(), id, sequence, created_at);
        conversation.record_message(&message);
        Self::write_snapshot(&mut tx, &conversation).await?;

        tx.commit().await.map_err(commit_error)?;

        Ok(AppendResult {
            message,
            conversation,
            deduplicated: false,
        })
    }

    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, StoreError> {
        let sql = format!("SELECT {} FROM messages WHERE id = $1", MESSAGE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("fetch message", e))?;

        row.as_ref().map(message_from_row).transpose()
    }

    async fn delete(&self, id: &MessageId, policy: SnapshotPolicy) -> Result<bool, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("begin transaction", e))?;

        let owner = sqlx::query("SELECT conversation_id FROM messages WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| store_error("fetch message owner", e))?;

        let conversation_id = match owner {
            Some(row) => ConversationId::from_uuid(
                row.try_get("conversation_id")
                    .map_err(|e| StoreError::database(format!("decode conversation_id: {}", e)))?,
            ),
            None => return Ok(false),
        };

        // Same lock order as append: conversation row first.
        let conversation = Self::lock_conversation(&mut tx, &conversation_id).await?;

        let deleted = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| store_error("delete message", e))?
            .rows_affected();

        if deleted == 0 {
            return Ok(false);
        }

        if let (SnapshotPolicy::Recompute, Some(mut conversation)) = (policy, conversation) {
            let sql = format!(
                r#"
                SELECT {} FROM messages
                WHERE conversation_id = $1
                ORDER BY created_at DESC, sequence DESC
                LIMIT 1
                "#,
                MESSAGE_COLUMNS
            );
            let newest = sqlx::query(&sql)
                .bind(conversation_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| store_error("fetch newest message", e))?
                .as_ref()
                .map(message_from_row)
                .transpose()?;

            conversation.replace_snapshot(newest.as_ref());
            Self::write_snapshot(&mut tx, &conversation).await?;
        }

        tx.commit().await.map_err(commit_error)?;
        Ok(true)
    }

    async fn newest_first(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Message>, StoreError> {
        let sql = format!(
            r#"
            SELECT {} FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC, sequence DESC
            LIMIT $2 OFFSET $3
            "#,
            MESSAGE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(conversation_id.as_uuid())
            .bind(i64::from(limit))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("page messages", e))?;

        rows.iter().map(message_from_row).collect()
    }
}
