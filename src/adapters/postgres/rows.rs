//! Row mapping shared by the PostgreSQL messaging adapters.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId};
use crate::domain::messaging::{Conversation, LastMessageSnapshot, Message, ParticipantPair};
use crate::ports::StoreError;

pub(crate) const CONVERSATION_COLUMNS: &str = "id, participant_low, participant_high, \
     created_at, updated_at, last_message_content, last_message_at, last_message_sender_id";

pub(crate) const MESSAGE_COLUMNS: &str = "id, conversation_id, sequence, sender_id, \
     receiver_id, content, created_at, is_read, client_token";

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::database(format!("decode column {}: {}", name, e)))
}

pub(crate) fn conversation_from_row(row: &PgRow) -> Result<Conversation, StoreError> {
    let id: Uuid = column(row, "id")?;
    let low: i64 = column(row, "participant_low")?;
    let high: i64 = column(row, "participant_high")?;
    let created_at: DateTime<Utc> = column(row, "created_at")?;
    let updated_at: DateTime<Utc> = column(row, "updated_at")?;
    let last_content: Option<String> = column(row, "last_message_content")?;
    let last_at: Option<DateTime<Utc>> = column(row, "last_message_at")?;
    let last_sender: Option<i64> = column(row, "last_message_sender_id")?;

    let pair = ParticipantPair::from_canonical(UserId::from_i64(low), UserId::from_i64(high))
        .map_err(|e| StoreError::database(format!("conversation {}: {}", id, e)))?;

    let last_message = match (last_content, last_at, last_sender) {
        (Some(content), Some(at), Some(sender)) => Some(LastMessageSnapshot {
            content,
            created_at: Timestamp::from_datetime(at),
            sender_id: UserId::from_i64(sender),
        }),
        _ => None,
    };

    Ok(Conversation::reconstitute(
        ConversationId::from_uuid(id),
        pair,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
        last_message,
    ))
}

pub(crate) fn message_from_row(row: &PgRow) -> Result<Message, StoreError> {
    let id: Uuid = column(row, "id")?;
    let conversation_id: Uuid = column(row, "conversation_id")?;
    let sequence: i64 = column(row, "sequence")?;
    let sender_id: i64 = column(row, "sender_id")?;
    let receiver_id: i64 = column(row, "receiver_id")?;
    let content: String = column(row, "content")?;
    let created_at: DateTime<Utc> = column(row, "created_at")?;
    let is_read: bool = column(row, "is_read")?;
    let client_token: Option<Uuid> = column(row, "client_token")?;

    Ok(Message::reconstitute(
        MessageId::from_uuid(id),
        ConversationId::from_uuid(conversation_id),
        sequence,
        UserId::from_i64(sender_id),
        UserId::from_i64(receiver_id),
        content,
        Timestamp::from_datetime(created_at),
        is_read,
        client_token,
    ))
}
