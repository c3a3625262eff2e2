//! PostgreSQL adapters for the messaging store ports.
//!
//! - `PostgresConversationRepository` - Pair-keyed conversation rows
//! - `PostgresMessageRepository` - Message log with atomic summary upkeep
//! - `PostgresReadStateRepository` - Read flags and unread counts
//! - `PostgresUserDirectory` - Read-only view of the platform `users` table

mod conversation_repository;
mod errors;
mod message_repository;
mod read_state_repository;
mod rows;
mod user_directory;

pub use conversation_repository::PostgresConversationRepository;
pub use message_repository::PostgresMessageRepository;
pub use read_state_repository::PostgresReadStateRepository;
pub use user_directory::PostgresUserDirectory;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;

/// Open a connection pool sized from configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(Some(config.idle_timeout()))
        .connect(&config.url)
        .await
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
