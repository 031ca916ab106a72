//! Database maintenance commands.

use std::path::PathBuf;

use anyhow::Context;

async fn connect() -> anyhow::Result<(eia_core::AppConfig, sqlx::PgPool)> {
    let config = eia_core::load_app_config()?;
    let pool = eia_db::connect_pool_from_config(&config)
        .await
        .context("failed to connect to database")?;
    Ok((config, pool))
}

pub(crate) async fn run_migrate() -> anyhow::Result<()> {
    let (_, pool) = connect().await?;
    let applied = eia_db::run_migrations(&pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Migrates, then seeds the catalog. A database that already holds products
/// is left as is.
pub(crate) async fn run_seed(catalog: Option<PathBuf>) -> anyhow::Result<()> {
    let (config, pool) = connect().await?;
    eia_db::run_migrations(&pool).await?;

    let path = catalog.unwrap_or(config.catalog_path);
    let catalog = eia_core::load_catalog(&path)
        .with_context(|| format!("failed to load catalog {}", path.display()))?;

    let summary = eia_db::seed_catalog(&pool, &catalog.products).await?;
    if summary.skipped {
        println!("products table is not empty; nothing seeded");
    } else {
        println!(
            "seeded {} product(s) and {} analysis record(s)",
            summary.products_inserted, summary.analyses_inserted
        );
    }
    Ok(())
}
