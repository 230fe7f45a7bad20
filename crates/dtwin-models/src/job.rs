//! Job record, status, and partial-update types.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::outputs::{StageOutput, StageOutputs};
use crate::persona::VoiceSettings;
use crate::workflow::{InputError, Stage, WorkflowVariant};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job lifecycle state.
///
/// Transitions are monotonic forward: `Created → Processing → {Completed,
/// Failed}`. `Processing` repeats once per stage; no job re-enters
/// `Created`, and nothing leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Record created, execution not yet started
    #[default]
    Created,
    /// A pipeline stage is running
    Processing,
    /// All required stages succeeded
    Completed,
    /// A required stage exhausted its retries
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Created => "created",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable snapshot of the request that created a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobInputs {
    /// Raw input text (text-entry variants)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Uploaded audio/video file (full pipeline)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,

    /// Persona to generate as
    pub persona_id: String,

    /// Optional extra context passed to text generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Requested workflow variant
    #[serde(default)]
    pub variant: WorkflowVariant,

    /// Voice settings override for synthesis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_settings: Option<VoiceSettings>,

    /// Avatar override for video rendering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_override: Option<String>,
}

impl JobInputs {
    /// Text-entry inputs for the default text-only variant.
    pub fn from_text(text: impl Into<String>, persona_id: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            media_ref: None,
            persona_id: persona_id.into(),
            context: None,
            variant: WorkflowVariant::TextOnly,
            voice_settings: None,
            avatar_override: None,
        }
    }

    /// Media inputs for the full pipeline.
    pub fn from_media(media_ref: impl Into<String>, persona_id: impl Into<String>) -> Self {
        Self {
            text: None,
            media_ref: Some(media_ref.into()),
            persona_id: persona_id.into(),
            context: None,
            variant: WorkflowVariant::Full,
            voice_settings: None,
            avatar_override: None,
        }
    }

    pub fn with_variant(mut self, variant: WorkflowVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Validate that the variant's entry input is present.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.variant.requires_media() && self.media_ref.is_none() {
            return Err(InputError::MissingMedia(self.variant));
        }
        if self.variant.requires_text() && self.text.as_deref().unwrap_or("").is_empty() {
            return Err(InputError::MissingText(self.variant));
        }
        Ok(())
    }
}

/// Partial-field merge payload for `JobStore::update`.
///
/// Field-granular: the shared backend merges each set field
/// individually rather than replacing the whole record, so a racing
/// duplicate execution cannot clobber a concurrent stage write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// At most one stage output append per update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<(Stage, StageOutput)>,
}

impl JobUpdate {
    /// Transition into `Processing` for the given stage.
    pub fn processing(stage: Stage, progress: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Processing),
            stage: Some(stage),
            progress: Some(progress.into()),
            ..Default::default()
        }
    }

    /// Append a successful stage output.
    pub fn stage_output(stage: Stage, output: StageOutput) -> Self {
        Self {
            output: Some((stage, output)),
            ..Default::default()
        }
    }

    /// Terminal success.
    pub fn completed(progress: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            progress: Some(progress.into()),
            ..Default::default()
        }
    }

    /// Terminal failure at the given stage.
    pub fn failed(stage: Stage, error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            stage: Some(stage),
            progress: Some("Processing failed".to_string()),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// The persisted unit of work state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobRecord {
    /// Unique job ID, immutable after creation
    pub id: JobId,

    /// Lifecycle state
    pub status: JobStatus,

    /// Current/last-attempted stage, empty before processing starts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,

    /// Immutable request snapshot
    pub inputs: JobInputs,

    /// Append-only per-stage results
    #[serde(default)]
    pub outputs: StageOutputs,

    /// Last error description, set only on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Human-readable status string for polling clients
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a fresh record in the `Created` state.
    pub fn new(inputs: JobInputs) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            status: JobStatus::Created,
            stage: None,
            inputs,
            outputs: StageOutputs::new(),
            error: None,
            progress: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the record is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Merge a partial update into this record and refresh `updated_at`.
    ///
    /// The caller is responsible for the terminal-immutability guard;
    /// both store backends refuse to apply updates to terminal records.
    pub fn apply(&mut self, update: &JobUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(stage) = update.stage {
            self.stage = Some(stage);
        }
        if let Some(progress) = &update.progress {
            self.progress = Some(progress.clone());
        }
        if let Some(error) = &update.error {
            self.error = Some(error.clone());
        }
        if let Some((stage, output)) = &update.output {
            self.outputs.insert(*stage, output.clone());
        }
        self.updated_at = Utc::now();
    }
}
