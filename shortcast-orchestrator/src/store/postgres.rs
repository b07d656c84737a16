//! Postgres run store
//!
//! Durable backend. One row per run; `inputs`, `stage_state`, and
//! `pending_interrupt` are stored as JSONB, status and stage as their wire
//! names. Survives orchestrator restarts, so a completed run's result can
//! be re-fetched by id after the hosting process comes back.

use async_trait::async_trait;
use shortcast_core::domain::gate::Interrupt;
use shortcast_core::domain::run::{PipelineRun, RunStatus};
use shortcast_core::domain::stage::Stage;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{RunStore, StoreError};

pub struct PostgresRunStore {
    pool: PgPool,
}

impl PostgresRunStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunStore for PostgresRunStore {
    async fn insert(&self, run: &PipelineRun) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO runs (id, status, current_stage, inputs, stage_state,
                              pending_interrupt, error, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(run.id)
        .bind(run.status.as_str())
        .bind(run.current_stage.map(|s| s.as_str()))
        .bind(serde_json::to_value(&run.inputs)?)
        .bind(serde_json::to_value(&run.stage_state)?)
        .bind(
            run.pending_interrupt
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        )
        .bind(&run.error)
        .bind(run.created_at)
        .bind(run.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<PipelineRun>, StoreError> {
        let row = sqlx::query_as::<_, RunRow>(
            r#"
            SELECT id, status, current_stage, inputs, stage_state,
                   pending_interrupt, error, created_at, updated_at
            FROM runs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PipelineRun::try_from).transpose()
    }

    async fn update(&self, run: &PipelineRun) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE runs
            SET status = $1, current_stage = $2, stage_state = $3,
                pending_interrupt = $4, error = $5, updated_at = $6
            WHERE id = $7
            "#,
        )
        .bind(run.status.as_str())
        .bind(run.current_stage.map(|s| s.as_str()))
        .bind(serde_json::to_value(&run.stage_state)?)
        .bind(
            run.pending_interrupt
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        )
        .bind(&run.error)
        .bind(run.updated_at)
        .bind(run.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct RunRow {
    id: Uuid,
    status: String,
    current_stage: Option<String>,
    inputs: serde_json::Value,
    stage_state: serde_json::Value,
    pending_interrupt: Option<serde_json::Value>,
    error: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<RunRow> for PipelineRun {
    type Error = StoreError;

    fn try_from(row: RunRow) -> Result<Self, StoreError> {
        let status = RunStatus::from_str(&row.status).unwrap_or(RunStatus::Failed);
        let current_stage = row.current_stage.as_deref().and_then(Stage::from_str);

        let pending_interrupt: Option<Interrupt> = row
            .pending_interrupt
            .map(serde_json::from_value)
            .transpose()?;

        Ok(PipelineRun {
            id: row.id,
            status,
            current_stage,
            inputs: serde_json::from_value(row.inputs)?,
            stage_state: serde_json::from_value(row.stage_state)?,
            pending_interrupt,
            error: row.error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
