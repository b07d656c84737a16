//! In-memory run store
//!
//! Volatile backend for deployments without a configured database. Fast,
//! lost on restart; behaviorally identical to the Postgres backend.

use std::collections::HashMap;

use async_trait::async_trait;
use shortcast_core::domain::run::PipelineRun;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{RunStore, StoreError};

#[derive(Default)]
pub struct MemoryRunStore {
    runs: RwLock<HashMap<Uuid, PipelineRun>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn insert(&self, run: &PipelineRun) -> Result<(), StoreError> {
        self.runs.write().await.insert(run.id, run.clone());
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<PipelineRun>, StoreError> {
        Ok(self.runs.read().await.get(&id).cloned())
    }

    async fn update(&self, run: &PipelineRun) -> Result<(), StoreError> {
        // Matches the SQL UPDATE: an unknown id affects nothing.
        let mut runs = self.runs.write().await;
        if let Some(slot) = runs.get_mut(&run.id) {
            *slot = run.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shortcast_core::domain::run::{RunInputs, RunStatus};

    #[tokio::test]
    async fn test_read_your_writes() {
        let store = MemoryRunStore::new();
        let run = PipelineRun::new(RunInputs::default());
        store.insert(&run).await.unwrap();

        let fetched = store.fetch(run.id).await.unwrap().unwrap();
        assert_eq!(fetched, run);

        let mut updated = run.clone();
        updated.status = RunStatus::Failed;
        updated.error = Some("boom".to_string());
        store.update(&updated).await.unwrap();

        let fetched = store.fetch(run.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, RunStatus::Failed);
        assert_eq!(fetched.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_fetch_unknown_id_is_none() {
        let store = MemoryRunStore::new();
        assert!(store.fetch(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_id_creates_nothing() {
        let store = MemoryRunStore::new();
        let run = PipelineRun::new(RunInputs::default());

        store.update(&run).await.unwrap();

        assert!(store.fetch(run.id).await.unwrap().is_none());
    }
}
