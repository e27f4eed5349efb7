use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use super::PostgresConfig;
use crate::error::{DatabaseError, DatabaseResult};
use crate::retry::{RetryConfig, retry_with_backoff};

/// Open a connection pool using the given settings
pub async fn connect(config: PostgresConfig) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(config.into_connect_options()).await?;
    info!("Connected to PostgreSQL");
    Ok(db)
}

/// Open a connection pool, retrying with backoff while the database is unreachable
///
/// ```ignore
/// use database::postgres::{PostgresConfig, connect_with_retry};
/// use database::RetryConfig;
///
/// let config = PostgresConfig::from_env()?;
/// let db = connect_with_retry(config, RetryConfig::new().with_max_retries(10)).await?;
/// ```
pub async fn connect_with_retry(
    config: PostgresConfig,
    retry: RetryConfig,
) -> Result<DatabaseConnection, DbErr> {
    retry_with_backoff(|| connect(config.clone()), retry).await
}

/// Apply all pending migrations of `M`
pub async fn run_migrations<M: MigratorTrait>(db: &DatabaseConnection) -> DatabaseResult<()> {
    info!("Running database migrations");
    M::up(db, None)
        .await
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
    info!("Database migrations complete");
    Ok(())
}
