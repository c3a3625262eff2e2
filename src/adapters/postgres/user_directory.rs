//! PostgreSQL-backed user directory.
//!
//! Reads the platform's `users` table, which this service does not own or
//! migrate. Only `id`, `display_name` and `avatar_url` are touched.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::UserId;
use crate::ports::{ProfileDirectory, StoreError, UserDirectory, UserProfile};

use super::errors::store_error;

#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn exists(&self, user: UserId) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user.as_i64())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error("check user exists", e))
    }
}

#[async_trait]
impl ProfileDirectory for PostgresUserDirectory {
    async fn profiles(&self, ids: &[UserId]) -> Result<HashMap<UserId, UserProfile>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let raw: Vec<i64> = ids.iter().map(UserId::as_i64).collect();

        let rows = sqlx::query(
            "SELECT id, display_name, avatar_url FROM users WHERE id = ANY($1)",
        )
        .bind(&raw)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("fetch profiles", e))?;

        rows.iter()
            .map(|row| {
                let decode = |e: sqlx::Error| StoreError::database(format!("decode user: {}", e));
                let id = UserId::from_i64(row.try_get("id").map_err(decode)?);
                let profile = UserProfile {
                    id,
                    display_name: row.try_get("display_name").map_err(decode)?,
                    avatar_url: row.try_get("avatar_url").map_err(decode)?,
                };
                Ok((id, profile))
            })
            .collect()
    }
}
