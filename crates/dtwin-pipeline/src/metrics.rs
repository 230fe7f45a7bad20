//! Pipeline metrics collection.

use metrics::counter;

use dtwin_models::Stage;

/// Metric name constants for consistency.
pub mod names {
    /// Finished jobs by terminal status.
    pub const JOBS_TOTAL: &str = "dtwin_jobs_total";

    /// Stage retry attempts by stage.
    pub const STAGE_RETRIES_TOTAL: &str = "dtwin_stage_retries_total";

    /// Terminal jobs evicted by the cleanup sweeper.
    pub const JOBS_SWEPT_TOTAL: &str = "dtwin_jobs_swept_total";
}

/// Record a job reaching a terminal status.
pub fn record_job_outcome(status: &str) {
    counter!(names::JOBS_TOTAL, "status" => status.to_string()).increment(1);
}

/// Record a stage retry attempt.
pub fn record_stage_retry(stage: Stage) {
    counter!(names::STAGE_RETRIES_TOTAL, "stage" => stage.as_str()).increment(1);
}

/// Record jobs evicted by the sweeper.
pub fn record_swept(count: usize) {
    counter!(names::JOBS_SWEPT_TOTAL).increment(count as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::JOBS_TOTAL.starts_with("dtwin_"));
        assert!(names::STAGE_RETRIES_TOTAL.contains("retries"));
        assert!(names::JOBS_SWEPT_TOTAL.contains("swept"));
    }
}
