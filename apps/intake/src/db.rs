use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates a PostgreSQL connection pool and brings the schema up to date.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("PostgreSQL connection failed")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Running migrations failed")?;

    info!("PostgreSQL connection pool established, migrations applied");
    Ok(pool)
}
