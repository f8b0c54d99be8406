//! Database migration runner.

use sqlx::PgPool;
use tracing::info;

use archivio_core::error::{AppError, ErrorKind};

/// Apply every pending migration from the embedded `migrations/` set.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    let migrator = sqlx::migrate!("../../migrations");
    info!(available = migrator.iter().count(), "Applying migrations");

    migrator.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    info!("Schema is up to date");
    Ok(())
}
