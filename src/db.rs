use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Connection pool over the system of record.
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    /// Opens the pool and verifies connectivity with a single ping.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        // Schema is applied out of band; see schema.sql
        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }
}
