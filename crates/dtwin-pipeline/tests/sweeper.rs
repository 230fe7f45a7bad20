//! Cleanup sweeper behavior against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use dtwin_models::{JobInputs, JobUpdate, Stage};
use dtwin_pipeline::{CleanupSweeper, PipelineConfig};
use dtwin_store::{JobStore, MemoryJobStore};

fn sweeper_with_max_age(store: Arc<MemoryJobStore>, max_age: Duration) -> CleanupSweeper {
    let config = PipelineConfig {
        job_max_age: max_age,
        ..Default::default()
    };
    CleanupSweeper::new(store, &config)
}

#[tokio::test]
async fn test_sweep_removes_old_terminal_jobs_only() {
    let store = Arc::new(MemoryJobStore::new());

    let done = store
        .create(JobInputs::from_text("pitch", "chad_goldstein"))
        .await
        .unwrap();
    store
        .update(&done.id, JobUpdate::completed("Processing completed successfully"))
        .await
        .unwrap();

    let running = store
        .create(JobInputs::from_text("pitch", "chad_goldstein"))
        .await
        .unwrap();
    store
        .update(
            &running.id,
            JobUpdate::processing(Stage::GenerateText, "Generating hot take..."),
        )
        .await
        .unwrap();

    // Everything is now "old"
    tokio::time::sleep(Duration::from_millis(20)).await;

    let sweeper = sweeper_with_max_age(store.clone(), Duration::ZERO);
    let removed = sweeper.run_once().await.unwrap();
    assert_eq!(removed, 1);

    // The terminal job is gone, the in-flight one survives
    assert!(store.get(&done.id).await.unwrap_err().is_not_found());
    assert!(store.get(&running.id).await.is_ok());
}

#[tokio::test]
async fn test_sweep_keeps_recent_terminal_jobs() {
    let store = Arc::new(MemoryJobStore::new());

    let done = store
        .create(JobInputs::from_text("pitch", "chad_goldstein"))
        .await
        .unwrap();
    store
        .update(&done.id, JobUpdate::completed("Processing completed successfully"))
        .await
        .unwrap();

    let sweeper = sweeper_with_max_age(store.clone(), Duration::from_secs(3600));
    let removed = sweeper.run_once().await.unwrap();

    assert_eq!(removed, 0);
    assert!(store.get(&done.id).await.is_ok());
}

#[tokio::test]
async fn test_sweep_on_empty_store_is_a_noop() {
    let store = Arc::new(MemoryJobStore::new());
    let sweeper = sweeper_with_max_age(store, Duration::ZERO);
    assert_eq!(sweeper.run_once().await.unwrap(), 0);
}
