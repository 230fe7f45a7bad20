//! The job store contract.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use dtwin_models::{JobId, JobInputs, JobRecord, JobUpdate};

use crate::error::StoreResult;

/// Durable/shared key-value store for job records.
///
/// Implemented identically by both backends. All job state flows
/// through `create`/`get`/`update`/`delete`; no component caches a
/// record across a suspension point and writes it back.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug {
    /// Allocate a fresh id and persist a record in the `created` state.
    async fn create(&self, inputs: JobInputs) -> StoreResult<JobRecord>;

    /// Fetch a record by id.
    async fn get(&self, id: &JobId) -> StoreResult<JobRecord>;

    /// Merge partial fields into an existing record and refresh
    /// `updated_at`, returning the merged record.
    ///
    /// The merge is atomic with respect to concurrent updates to the
    /// same id at field granularity (last-writer-wins per field, never
    /// whole-record replace). Updates against a terminal record are
    /// ignored and return the record unchanged.
    async fn update(&self, id: &JobId, update: JobUpdate) -> StoreResult<JobRecord>;

    /// Delete a record. Returns `false` if the id did not exist.
    async fn delete(&self, id: &JobId) -> StoreResult<bool>;

    /// Ids of terminal jobs whose `updated_at` is older than `age`.
    ///
    /// Non-terminal jobs are never listed regardless of age; a stuck
    /// `processing` job is a bug to surface, not to silently delete.
    async fn list_terminal_older_than(&self, age: Duration) -> StoreResult<Vec<JobId>>;

    /// Delete terminal jobs older than `max_age`, returning the count.
    async fn cleanup_old(&self, max_age: Duration) -> StoreResult<usize> {
        let ids = self.list_terminal_older_than(max_age).await?;
        let mut removed = 0usize;
        for id in &ids {
            if self.delete(id).await? {
                removed += 1;
            }
        }
        if removed > 0 {
            info!("Cleaned up {} old jobs", removed);
        }
        Ok(removed)
    }
}
