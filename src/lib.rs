//! Bookshelf application library
//!
//! Wires the books module into the kernel registry and runs the HTTP server.

pub mod modules;

use std::sync::Arc;

use anyhow::Context;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sqlx::PgPool;

use modules::books::repository::PgBookRepository;

/// Registry with every module bound to `pool`
pub fn build_registry(pool: &PgPool) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, Arc::new(PgBookRepository::new(pool.clone())))?;
    Ok(registry)
}

/// Connect and bring the schema up to date. Any failure here is fatal.
pub async fn bootstrap(settings: &Settings) -> anyhow::Result<(PgPool, ModuleRegistry)> {
    let pool = bookshelf_db::connect(settings).await?;
    let registry = build_registry(&pool)?;

    bookshelf_db::run_migrations(&pool, &registry.collect_migrations())
        .await
        .with_context(|| "failed to ensure schema")?;

    Ok((pool, registry))
}

/// Run only the schema bootstrap, then release the pool.
pub async fn migrate(settings: &Settings) -> anyhow::Result<()> {
    let (pool, _registry) = bootstrap(settings).await?;
    pool.close().await;
    Ok(())
}

/// Bootstrap, serve until shutdown, then stop modules and close the pool.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    tracing::info!(env = ?settings.environment, "bookshelf bootstrap starting");

    let (pool, registry) = bootstrap(settings).await?;
    let ctx = InitCtx { settings };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, &settings.server).await;

    let stopped = registry.stop_modules().await;
    pool.close().await;
    tracing::info!("bookshelf shut down");

    served.and(stopped)
}
