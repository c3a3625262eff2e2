//! PostgreSQL implementation of ConversationRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::messaging::{Conversation, ParticipantPair};
use crate::ports::{ConversationRepository, StoreError};

use super::errors::store_error;
use super::rows::{conversation_from_row, CONVERSATION_COLUMNS};

/// PostgreSQL implementation of ConversationRepository.
#[derive(Clone)]
pub struct PostgresConversationRepository {
    pool: PgPool,
}

impl PostgresConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PostgresConversationRepository {
    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        let sql = format!("SELECT {} FROM conversations WHERE id = $1", CONVERSATION_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("fetch conversation", e))?;

        row.as_ref().map(conversation_from_row).transpose()
    }

    async fn find_by_pair(
        &self,
        pair: &ParticipantPair,
    ) -> Result<Option<Conversation>, StoreError> {
        let sql = format!(
            "SELECT {} FROM conversations WHERE participant_low = $1 AND participant_high = $2",
            CONVERSATION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(pair.low().as_i64())
            .bind(pair.high().as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("fetch conversation by pair", e))?;

        row.as_ref().map(conversation_from_row).transpose()
    }

    async fn insert(&self, conversation: &Conversation) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (
                id, participant_low, participant_high, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(conversation.id().as_uuid())
        .bind(conversation.pair().low().as_i64())
        .bind(conversation.pair().high().as_i64())
        .bind(conversation.created_at().as_datetime())
        .bind(conversation.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("insert conversation", e))?;

        Ok(())
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Conversation>, StoreError> {
        let sql = format!(
            r#"
            SELECT {} FROM conversations
            WHERE participant_low = $1 OR participant_high = $1
            ORDER BY updated_at DESC, id
            "#,
            CONVERSATION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user.as_i64())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("list conversations", e))?;

        rows.iter().map(conversation_from_row).collect()
    }
}
