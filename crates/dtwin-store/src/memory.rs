//! In-memory job store.
//!
//! Process-local map for development and single-worker deployments.
//! Data is lost on restart and invisible to sibling worker processes,
//! which is why `StoreConfig::validate` rejects this backend when more
//! than one worker is configured.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use dtwin_models::{JobId, JobInputs, JobRecord, JobUpdate};

use crate::error::{StoreError, StoreResult};
use crate::store::JobStore;

/// Process-local job store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, JobRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, inputs: JobInputs) -> StoreResult<JobRecord> {
        let record = JobRecord::new(inputs);
        let mut jobs = self.jobs.write().await;
        jobs.insert(record.id.as_str().to_string(), record.clone());
        debug!(job_id = %record.id, "Created job");
        Ok(record)
    }

    async fn get(&self, id: &JobId) -> StoreResult<JobRecord> {
        let jobs = self.jobs.read().await;
        jobs.get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::not_found(id.as_str()))
    }

    async fn update(&self, id: &JobId, update: JobUpdate) -> StoreResult<JobRecord> {
        let mut jobs = self.jobs.write().await;
        let record = jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::not_found(id.as_str()))?;

        // Terminal records are immutable except for deletion.
        if record.is_terminal() {
            debug!(job_id = %id, status = %record.status, "Ignoring update to terminal job");
            return Ok(record.clone());
        }

        record.apply(&update);
        Ok(record.clone())
    }

    async fn delete(&self, id: &JobId) -> StoreResult<bool> {
        let mut jobs = self.jobs.write().await;
        Ok(jobs.remove(id.as_str()).is_some())
    }

    async fn list_terminal_older_than(&self, age: Duration) -> StoreResult<Vec<JobId>> {
        let cutoff = chrono::Utc::now()
            - chrono::Duration::from_std(age).unwrap_or_else(|_| chrono::Duration::zero());

        let jobs = self.jobs.read().await;
        Ok(jobs
            .values()
            .filter(|r| r.is_terminal() && r.updated_at < cutoff)
            .map(|r| r.id.clone())
            .collect())
    }
}
