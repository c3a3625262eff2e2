//! PostgreSQL implementation of ReadStateRepository.
//!
//! Every write is a single conditional `UPDATE`, so no explicit transaction
//! is needed.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::{ConversationId, MessageId, UserId};
use crate::ports::{ReadStateRepository, StoreError};

use super::errors::store_error;

/// PostgreSQL implementation of ReadStateRepository.
#[derive(Clone)]
pub struct PostgresReadStateRepository {
    pool: PgPool,
}

impl PostgresReadStateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[async_trait]
impl ReadStateRepository for PostgresReadStateRepository {
    async fn mark_read(&self, id: &MessageId, reader: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE messages SET is_read = TRUE
            WHERE id = $1 AND receiver_id = $2 AND is_read = FALSE
            "#,
        )
        .bind(id.as_uuid())
        .bind(reader.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("mark message read", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: &ConversationId,
        reader: UserId,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE messages SET is_read = TRUE
            WHERE conversation_id = $1 AND receiver_id = $2 AND is_read = FALSE
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(reader.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("mark conversation read", e))?;

        Ok(result.rows_affected())
    }

    async fn unread_for_user(&self, user: UserId) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = $1 AND is_read = FALSE",
        )
        .bind(user.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("count unread", e))?;

        Ok(to_count(count))
    }

    async fn unread_for_conversation(
        &self,
        conversation_id: &ConversationId,
        user: UserId,
    ) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM messages
            WHERE conversation_id = $1 AND receiver_id = $2 AND is_read = FALSE
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(user.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("count unread in conversation", e))?;

        Ok(to_count(count))
    }

    async fn unread_counts_by_conversation(
        &self,
        user: UserId,
    ) -> Result<HashMap<ConversationId, u64>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT conversation_id, COUNT(*) AS unread
            FROM messages
            WHERE receiver_id = $1 AND is_read = FALSE
            GROUP BY conversation_id
            "#,
        )
        .bind(user.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("count unread by conversation", e))?;

        rows.iter()
            .map(|row| {
                let id: Uuid = row
                    .try_get("conversation_id")
                    .map_err(|e| StoreError::database(e.to_string()))?;
                let unread: i64 = row
                    .try_get("unread")
                    .map_err(|e| StoreError::database(e.to_string()))?;
                Ok((ConversationId::from_uuid(id), to_count(unread)))
            })
            .collect()
    }
}
