use std::sync::Arc;

use campus_dm::adapters::auth::{JwtConfig, JwtSessionValidator};
use campus_dm::adapters::http::messaging::{MessagingHandlers, MessagingLimits, MessagingPorts};
use campus_dm::adapters::http::{build_router, HttpSettings};
use campus_dm::adapters::memory::{InMemoryMessagingStore, InMemoryUserDirectory};
use campus_dm::adapters::postgres::{
    self, PostgresConversationRepository, PostgresMessageRepository,
    PostgresReadStateRepository, PostgresUserDirectory,
};
use campus_dm::config::{AppConfig, DatabaseConfig};
use campus_dm::ports::SnapshotPolicy;
use campus_dm::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    telemetry::init_tracing(&config.server);
    config.validate()?;

    let ports = build_ports(&config.database).await?;

    let policy = if config.features.recompute_snapshot_on_delete {
        SnapshotPolicy::Recompute
    } else {
        SnapshotPolicy::Keep
    };
    let limits = MessagingLimits {
        max_content_length: config.messaging.max_content_length,
        default_page_size: config.messaging.default_page_size,
        max_page_size: config.messaging.max_page_size,
        verbose_errors: config.features.verbose_errors,
    };
    let handlers = MessagingHandlers::from_ports(ports, policy, limits);

    let validator = JwtSessionValidator::new(
        JwtConfig::new(
            config.auth.jwt_secret.clone(),
            config.auth.issuer.clone(),
            config.auth.audience.clone(),
        )
        .with_leeway(config.auth.leeway_secs),
    );
    let settings = HttpSettings {
        cors_origins: config.server.cors_origins_list(),
        request_timeout: config.server.request_timeout(),
    };
    let app = build_router(handlers, Arc::new(validator), &settings);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "campus-dm listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("campus-dm stopped");
    Ok(())
}

async fn build_ports(
    database: &DatabaseConfig,
) -> Result<MessagingPorts, Box<dyn std::error::Error>> {
    if database.is_in_memory() {
        tracing::warn!("using in-memory store; data is lost on exit");
        let store = Arc::new(InMemoryMessagingStore::new());
        let directory = Arc::new(InMemoryUserDirectory::open());
        return Ok(MessagingPorts {
            conversations: store.clone(),
            messages: store.clone(),
            read_state: store,
            users: directory.clone(),
            profiles: directory,
        });
    }

    let pool = postgres::connect(database).await?;
    if database.run_migrations {
        postgres::run_migrations(&pool).await?;
        tracing::info!("database migrations applied");
    }

    let directory = Arc::new(PostgresUserDirectory::new(pool.clone()));
    Ok(MessagingPorts {
        conversations: Arc::new(PostgresConversationRepository::new(pool.clone())),
        messages: Arc::new(PostgresMessageRepository::new(pool.clone())),
        read_state: Arc::new(PostgresReadStateRepository::new(pool)),
        users: directory.clone(),
        profiles: directory,
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
