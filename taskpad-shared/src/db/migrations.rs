/// Database migration runner
///
/// Wraps sqlx's embedded migration system. Migration files live in
/// `taskpad-shared/migrations/` and are compiled into the binary, so
/// deployments need no separate migration step: the API server runs
/// pending migrations at startup.

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Runs all pending database migrations
///
/// Already-applied migrations are skipped; each pending one runs in a
/// transaction where possible.
///
/// # Errors
///
/// Returns an error if a migration fails to execute or the connection is
/// lost mid-run.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let migrations = sqlx::migrate!("./migrations");

    match migrations.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}
