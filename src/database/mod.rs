//! Postgres access: pool setup, embedded migrations and the repositories
//! behind [`DataStore`].

pub mod customer_repository;
pub mod error;
pub mod feedback_repository;
pub mod store;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{error as log_error, info, warn};

use self::error::DatabaseError;
use crate::config::DatabaseConfig;

pub use store::{DataStore, PgDataStore};

const MAX_LIFETIME: Duration = Duration::from_secs(30 * 60);
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Sizing and timeouts for the connection pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl From<&DatabaseConfig> for PoolConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            acquire_timeout: Duration::from_secs(config.connection_timeout),
            idle_timeout: Duration::from_secs(
                config.idle_timeout.unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS),
            ),
        }
    }
}

pub async fn init_pool(database_url: &str, config: &PoolConfig) -> Result<PgPool, DatabaseError> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout = ?config.acquire_timeout,
        "Connecting to Postgres"
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(MAX_LIFETIME)
        .connect(database_url)
        .await
        .map_err(|e| {
            log_error!("Could not open database pool: {}", e);
            DatabaseError::from_sqlx(e)
        })
}

pub async fn init_pool_from_config(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    init_pool(&config.url, &PoolConfig::from(config)).await
}

/// Bring the schema up to date (`customers`, `feedback`)
pub async fn run_migrations(pool: &PgPool) -> Result<(), DatabaseError> {
    if let Err(e) = sqlx::migrate!("./migrations").run(pool).await {
        log_error!("Database migration failed: {}", e);
        return Err(DatabaseError::from_migration(e));
    }

    info!("Database migrations applied");
    Ok(())
}

/// Round trip a trivial query
pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| {
            warn!("Database ping failed: {}", e);
            DatabaseError::from_sqlx(e)
        })
}
