//! Background eviction of old terminal jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use dtwin_store::{JobStore, StoreResult};

use crate::config::PipelineConfig;
use crate::metrics::record_swept;

/// Periodically deletes completed/failed jobs past their retention age.
///
/// Only terminal jobs are ever touched; a stuck `processing` record is
/// left in place regardless of age.
pub struct CleanupSweeper {
    store: Arc<dyn JobStore>,
    sweep_interval: Duration,
    max_age: Duration,
    enabled: bool,
}

impl CleanupSweeper {
    pub fn new(store: Arc<dyn JobStore>, config: &PipelineConfig) -> Self {
        let enabled = std::env::var("ENABLE_JOB_CLEANUP")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        Self {
            store,
            sweep_interval: config.sweep_interval,
            max_age: config.job_max_age,
            enabled,
        }
    }

    /// Start the background sweep loop.
    ///
    /// Runs indefinitely; spawn as a background task.
    pub async fn run(&self) {
        if !self.enabled {
            info!("Job cleanup is disabled");
            return;
        }

        info!(
            interval_secs = self.sweep_interval.as_secs(),
            max_age_secs = self.max_age.as_secs(),
            "Starting cleanup sweeper"
        );

        let mut ticker = interval(self.sweep_interval);

        loop {
            ticker.tick().await;

            if let Err(e) = self.run_once().await {
                error!("Job cleanup error: {}", e);
            }
        }
    }

    /// Run a single sweep cycle, returning the number of evicted jobs.
    pub async fn run_once(&self) -> StoreResult<usize> {
        let removed = self.store.cleanup_old(self.max_age).await?;
        if removed > 0 {
            record_swept(removed);
        }
        Ok(removed)
    }
}
