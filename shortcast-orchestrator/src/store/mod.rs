//! Run Store
//!
//! Durable keyed storage for pipeline runs. Two backends share one trait
//! and identical observable behavior: a volatile in-memory map and a
//! Postgres-backed store that survives process restarts. Callers cannot
//! tell which backend served them from the run's public fields.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use shortcast_core::domain::run::PipelineRun;
use uuid::Uuid;

pub use memory::MemoryRunStore;
pub use postgres::PostgresRunStore;

/// Store error type
#[derive(Debug)]
pub enum StoreError {
    Database(sqlx::Error),
    Serialization(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(err) => write!(f, "database error: {}", err),
            StoreError::Serialization(err) => write!(f, "serialization error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err)
    }
}

/// Keyed `run_id -> PipelineRun` storage with read-your-writes consistency:
/// once `insert` or `update` returns, a subsequent `fetch` by any caller
/// observes the written value.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Persist a newly created run.
    async fn insert(&self, run: &PipelineRun) -> Result<(), StoreError>;

    /// Fetch a run by id. `None` means the id was never inserted; the
    /// engine never deletes runs (retention is an external policy).
    async fn fetch(&self, id: Uuid) -> Result<Option<PipelineRun>, StoreError>;

    /// Replace the stored run with the given state. Updating an id that was
    /// never inserted is a no-op on both backends: no entry is created and
    /// no error is returned.
    async fn update(&self, run: &PipelineRun) -> Result<(), StoreError>;
}
