//! Job orchestration.
//!
//! `submit` validates inputs, resolves the persona, persists a fresh
//! record, and spawns the job execution as a background task. All
//! in-flight state lives in the job store; execution failures land on
//! the record, never on the submitter.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use dtwin_models::{JobId, JobInputs, JobRecord, JobUpdate, Persona, Stage};
use dtwin_providers::PersonaResolver;
use dtwin_store::JobStore;

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::metrics::record_job_outcome;
use crate::stages::{Providers, StageRunner};

const COMPLETED_MESSAGE: &str = "Processing completed successfully";

fn progress_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Transcribe => "Transcribing media...",
        Stage::GenerateText => "Generating hot take...",
        Stage::SynthesizeVoice => "Generating voice...",
        Stage::RenderVideo => "Generating video...",
    }
}

/// Drives jobs through their workflow's stage list.
pub struct Orchestrator {
    store: Arc<dyn JobStore>,
    runner: Arc<StageRunner>,
    personas: Arc<dyn PersonaResolver>,
    output_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn JobStore>, providers: Providers, config: PipelineConfig) -> Self {
        let personas = providers.personas.clone();
        let output_dir = config.output_dir.clone();
        Self {
            store,
            runner: Arc::new(StageRunner::new(providers, config)),
            personas,
            output_dir,
        }
    }

    /// Validate and persist a new job, then start executing it.
    ///
    /// Returns as soon as the record exists; callers poll `get_status`
    /// for progress. Validation and persona-resolution failures happen
    /// before the record is created, so nothing is left behind.
    pub async fn submit(&self, inputs: JobInputs) -> PipelineResult<JobId> {
        inputs.validate()?;
        let persona = self.personas.resolve(&inputs.persona_id).await?;

        let record = self.store.create(inputs).await?;
        let id = record.id.clone();
        info!(
            job_id = %id,
            variant = %record.inputs.variant,
            persona = %record.inputs.persona_id,
            "Job submitted"
        );

        let store = Arc::clone(&self.store);
        let runner = Arc::clone(&self.runner);
        let work_dir = self.output_dir.join(id.as_str());
        tokio::spawn(async move {
            run_job(store, runner, persona, record, work_dir).await;
        });

        Ok(id)
    }

    /// Fetch the current record for polling clients.
    pub async fn get_status(&self, id: &JobId) -> PipelineResult<JobRecord> {
        Ok(self.store.get(id).await?)
    }
}

/// Execute every stage of the job's variant in order.
///
/// Stops at the first stage that exhausts its retries, marking the job
/// failed with that stage and error. Store write failures abort the
/// execution; the record is left as-is for the sweeper or operator.
async fn run_job(
    store: Arc<dyn JobStore>,
    runner: Arc<StageRunner>,
    persona: Persona,
    mut record: JobRecord,
    work_dir: PathBuf,
) {
    let stages = record.inputs.variant.stages();

    if let Err(e) = tokio::fs::create_dir_all(&work_dir).await {
        error!(job_id = %record.id, "Failed to create job work dir: {}", e);
        let stage = stages[0];
        store
            .update(
                &record.id,
                JobUpdate::failed(stage, format!("could not create output directory: {}", e)),
            )
            .await
            .ok();
        record_job_outcome("failed");
        return;
    }

    for &stage in stages {
        record = match store
            .update(&record.id, JobUpdate::processing(stage, progress_message(stage)))
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!(job_id = %record.id, stage = %stage, "Store update failed, aborting job: {}", e);
                return;
            }
        };

        match runner.run_stage(&record, &persona, stage, &work_dir).await {
            Ok(output) => {
                info!(job_id = %record.id, stage = %stage, "Stage completed");
                record = match store
                    .update(&record.id, JobUpdate::stage_output(stage, output))
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        error!(job_id = %record.id, stage = %stage, "Store update failed, aborting job: {}", e);
                        return;
                    }
                };
            }
            Err(e) => {
                warn!(job_id = %record.id, stage = %stage, "Job failed: {}", e.message);
                store
                    .update(&record.id, JobUpdate::failed(stage, e.message))
                    .await
                    .ok();
                record_job_outcome("failed");
                return;
            }
        }
    }

    if let Err(e) = store
        .update(&record.id, JobUpdate::completed(COMPLETED_MESSAGE))
        .await
    {
        error!(job_id = %record.id, "Failed to mark job completed: {}", e);
        return;
    }

    info!(job_id = %record.id, "Job completed");
    record_job_outcome("completed");
}
