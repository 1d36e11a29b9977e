//! PostgreSQL pool factory and schema bootstrap.

use std::time::Duration;

use anyhow::Context;
use bookshelf_kernel::{settings::Settings, Migration};
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Key for the transaction-scoped advisory lock held while migrations run.
/// Processes starting at the same time queue on it instead of racing on the catalog.
const MIGRATION_LOCK_KEY: i64 = 0x626f_6f6b_7368_656c;

/// Open the connection pool and verify the database answers.
pub async fn connect(settings: &Settings) -> anyhow::Result<PgPool> {
    let url = settings.database_url()?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .acquire_timeout(Duration::from_millis(settings.database.acquire_timeout_ms))
        .connect(url)
        .await
        .with_context(|| "failed to connect to database")?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .with_context(|| "database did not answer ping")?;

    tracing::info!(
        target: "bookshelf-db",
        max_connections = settings.database.max_connections,
        "database pool ready"
    );

    Ok(pool)
}

/// Apply module migrations in one transaction.
///
/// Statements must be idempotent (`IF NOT EXISTS`); nothing records which ones ran,
/// so the whole list is replayed on every start.
pub async fn run_migrations(pool: &PgPool, migrations: &[(String, Migration)]) -> anyhow::Result<()> {
    let mut tx = pool
        .begin()
        .await
        .with_context(|| "failed to open migration transaction")?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *tx)
        .await
        .with_context(|| "failed to acquire migration lock")?;

    for (module, migration) in migrations {
        tracing::info!(
            target: "bookshelf-db",
            module = %module,
            migration = migration.id,
            "applying migration"
        );

        sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(migration.up))
            .await
            .with_context(|| format!("migration '{}/{}' failed", module, migration.id))?;
    }

    tx.commit()
        .await
        .with_context(|| "failed to commit migrations")?;

    tracing::info!(target: "bookshelf-db", count = migrations.len(), "schema up to date");

    Ok(())
}
