use std::time::Duration;

use nerostack_core::AppError;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("../../crates/infrastructure/migrations");

pub async fn connect_database(database_url: &str) -> Result<PgPool, AppError> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    info!(migrations = MIGRATOR.iter().count(), "database schema is up to date");
    Ok(())
}
