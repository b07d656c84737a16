use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create runs table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS runs (
            id UUID PRIMARY KEY,
            status VARCHAR(50) NOT NULL,
            current_stage VARCHAR(50),
            inputs JSONB NOT NULL DEFAULT '{}',
            stage_state JSONB NOT NULL DEFAULT '{}',
            pending_interrupt JSONB,
            error TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for better query performance
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_runs_status ON runs(status)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_runs_created_at ON runs(created_at DESC)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
