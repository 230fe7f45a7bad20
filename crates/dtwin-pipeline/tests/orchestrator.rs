//! End-to-end orchestrator tests against in-process fake providers.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use dtwin_models::{
    JobId, JobInputs, JobRecord, JobStatus, JobUpdate, Persona, Stage, VoiceSettings,
    WorkflowVariant,
};
use dtwin_pipeline::{Orchestrator, PipelineConfig, Providers, RetryConfig};
use dtwin_providers::{
    FilePersonaResolver, GeneratedTake, ProviderError, ProviderResult, RenderedVideo,
    TextGenerator, Transcriber, VideoRenderer, VoiceSynthesizer,
};
use dtwin_store::{JobStore, MemoryJobStore};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FakeTranscriber {
    text: String,
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _media_path: &Path) -> ProviderResult<String> {
        Ok(self.text.clone())
    }
}

/// Fails the first `failures` calls with a retryable error, then succeeds.
struct FlakyGenerator {
    failures: AtomicU32,
    calls: AtomicU32,
}

impl FlakyGenerator {
    fn new(failures: u32) -> Self {
        Self {
            failures: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl TextGenerator for FlakyGenerator {
    async fn generate(
        &self,
        text: &str,
        _context: Option<&str>,
        _persona: &Persona,
    ) -> ProviderResult<GeneratedTake> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(ProviderError::Api {
                status: 503,
                message: "upstream overloaded".into(),
                retryable: true,
            });
        }
        Ok(GeneratedTake {
            text: format!("Hot take on: {}", text),
            total_tokens: 120,
            latency_ms: 5,
        })
    }
}

struct FakeVoice;

#[async_trait]
impl VoiceSynthesizer for FakeVoice {
    async fn synthesize(
        &self,
        _text: &str,
        _voice_id: &str,
        _settings: &VoiceSettings,
        out_path: &Path,
    ) -> ProviderResult<PathBuf> {
        tokio::fs::write(out_path, b"fake-mp3").await?;
        Ok(out_path.to_path_buf())
    }
}

/// Always fails with a permanent error.
struct BrokenVoice;

#[async_trait]
impl VoiceSynthesizer for BrokenVoice {
    async fn synthesize(
        &self,
        _text: &str,
        _voice_id: &str,
        _settings: &VoiceSettings,
        _out_path: &Path,
    ) -> ProviderResult<PathBuf> {
        Err(ProviderError::Auth("voice quota exhausted".into()))
    }
}

#[derive(Default)]
struct FakeVideo {
    from_audio_called: AtomicBool,
    from_text_called: AtomicBool,
}

#[async_trait]
impl VideoRenderer for FakeVideo {
    async fn render_from_audio(
        &self,
        _audio_path: &Path,
        _avatar_id: &str,
        out_path: &Path,
    ) -> ProviderResult<RenderedVideo> {
        self.from_audio_called.store(true, Ordering::SeqCst);
        tokio::fs::write(out_path, b"fake-mp4").await?;
        Ok(RenderedVideo {
            path: out_path.to_path_buf(),
            video_id: "vid-audio".into(),
        })
    }

    async fn render_from_text(
        &self,
        _text: &str,
        _avatar_id: &str,
        _voice_id: &str,
        out_path: &Path,
    ) -> ProviderResult<RenderedVideo> {
        self.from_text_called.store(true, Ordering::SeqCst);
        tokio::fs::write(out_path, b"fake-mp4").await?;
        Ok(RenderedVideo {
            path: out_path.to_path_buf(),
            video_id: "vid-text".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

fn test_persona() -> Persona {
    Persona {
        name: "Chad Goldstein".into(),
        bio: "VC".into(),
        prompt: "You are Chad.".into(),
        elevenlabs_voice_id: Some("voice-11l".into()),
        heygen_voice_id: Some("voice-hg".into()),
        heygen_avatar_id: Some("avatar-1".into()),
        description: None,
    }
}

fn resolver() -> Arc<FilePersonaResolver> {
    let mut personas = std::collections::HashMap::new();
    personas.insert("chad_goldstein".to_string(), test_persona());
    Arc::new(FilePersonaResolver::from_personas(personas))
}

struct Harness {
    store: Arc<MemoryJobStore>,
    orchestrator: Orchestrator,
    video: Arc<FakeVideo>,
    _dir: tempfile::TempDir,
}

fn harness_with(generator: Arc<dyn TextGenerator>, voice: Arc<dyn VoiceSynthesizer>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryJobStore::new());
    let video = Arc::new(FakeVideo::default());

    let providers = Providers {
        transcriber: Arc::new(FakeTranscriber {
            text: "transcribed pitch".into(),
        }),
        generator,
        voice,
        video: video.clone(),
        personas: resolver(),
    };

    let config = PipelineConfig {
        output_dir: dir.path().to_path_buf(),
        retry: RetryConfig::default().with_base_delay(Duration::from_millis(1)),
        ..Default::default()
    };

    let orchestrator = Orchestrator::new(store.clone(), providers, config);
    Harness {
        store,
        orchestrator,
        video,
        _dir: dir,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(FlakyGenerator::new(0)), Arc::new(FakeVoice))
}

async fn wait_terminal(harness: &Harness, id: &JobId) -> JobRecord {
    for _ in 0..500 {
        let record = harness.orchestrator.get_status(id).await.unwrap();
        if record.is_terminal() {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never reached a terminal state", id);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_text_only_job_completes_with_ordered_outputs() {
    let harness = harness();
    let id = harness
        .orchestrator
        .submit(JobInputs::from_text("my startup pitch", "chad_goldstein"))
        .await
        .unwrap();

    let record = wait_terminal(&harness, &id).await;

    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(
        record.progress.as_deref(),
        Some("Processing completed successfully")
    );
    assert!(record.error.is_none());
    assert_eq!(
        record.outputs.stages(),
        vec![Stage::GenerateText, Stage::SynthesizeVoice, Stage::RenderVideo]
    );

    let take = record
        .outputs
        .get(Stage::GenerateText)
        .and_then(|o| o.generated_text())
        .unwrap();
    assert_eq!(take, "Hot take on: my startup pitch");

    // Audio was lip-synced, not platform voice
    assert!(harness.video.from_audio_called.load(Ordering::SeqCst));
    assert!(!harness.video.from_text_called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_full_pipeline_feeds_transcript_into_generation() {
    let harness = harness();
    let id = harness
        .orchestrator
        .submit(JobInputs::from_media("/tmp/pitch.mp4", "chad_goldstein"))
        .await
        .unwrap();

    let record = wait_terminal(&harness, &id).await;

    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(
        record.outputs.stages(),
        vec![
            Stage::Transcribe,
            Stage::GenerateText,
            Stage::SynthesizeVoice,
            Stage::RenderVideo,
        ]
    );
    assert_eq!(
        record
            .outputs
            .get(Stage::GenerateText)
            .and_then(|o| o.generated_text()),
        Some("Hot take on: transcribed pitch")
    );
}

#[tokio::test]
async fn test_retryable_failures_are_retried_to_success() {
    let generator = Arc::new(FlakyGenerator::new(2));
    let harness = harness_with(generator.clone(), Arc::new(FakeVoice));

    let id = harness
        .orchestrator
        .submit(JobInputs::from_text("pitch", "chad_goldstein"))
        .await
        .unwrap();

    let record = wait_terminal(&harness, &id).await;

    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    // Exactly one output for the retried stage
    assert_eq!(
        record
            .outputs
            .iter()
            .filter(|(s, _)| *s == Stage::GenerateText)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_permanent_failure_stops_the_pipeline() {
    let harness = harness_with(Arc::new(FlakyGenerator::new(0)), Arc::new(BrokenVoice));

    let id = harness
        .orchestrator
        .submit(JobInputs::from_text("pitch", "chad_goldstein"))
        .await
        .unwrap();

    let record = wait_terminal(&harness, &id).await;

    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.stage, Some(Stage::SynthesizeVoice));
    assert!(record
        .error
        .as_deref()
        .unwrap()
        .contains("voice quota exhausted"));
    // Earlier outputs survive, later stages never ran
    assert_eq!(record.outputs.stages(), vec![Stage::GenerateText]);
    assert!(!harness.video.from_audio_called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_direct_voice_video_uses_platform_voice() {
    let harness = harness();
    let inputs = JobInputs::from_text("pitch", "chad_goldstein")
        .with_variant(WorkflowVariant::DirectVoiceVideo);

    let id = harness.orchestrator.submit(inputs).await.unwrap();
    let record = wait_terminal(&harness, &id).await;

    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(
        record.outputs.stages(),
        vec![Stage::GenerateText, Stage::RenderVideo]
    );
    assert!(harness.video.from_text_called.load(Ordering::SeqCst));
    assert!(!harness.video.from_audio_called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_invalid_inputs_are_rejected_before_creation() {
    let harness = harness();
    let inputs = JobInputs::from_text("pitch", "chad_goldstein").with_variant(WorkflowVariant::Full);

    let err = harness.orchestrator.submit(inputs).await.unwrap_err();
    assert!(matches!(
        err,
        dtwin_pipeline::PipelineError::InvalidInput(_)
    ));
}

#[tokio::test]
async fn test_unknown_persona_is_rejected_before_creation() {
    let harness = harness();
    let err = harness
        .orchestrator
        .submit(JobInputs::from_text("pitch", "nobody"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_terminal_record_is_not_mutated_afterwards() {
    let harness = harness();
    let id = harness
        .orchestrator
        .submit(JobInputs::from_text("pitch", "chad_goldstein"))
        .await
        .unwrap();

    let record = wait_terminal(&harness, &id).await;

    // A straggling update against the finished job is a no-op
    let after = harness
        .store
        .update(&id, JobUpdate::processing(Stage::RenderVideo, "late write"))
        .await
        .unwrap();

    assert_eq!(after.status, record.status);
    assert_eq!(after.progress, record.progress);
    assert_eq!(after.updated_at, record.updated_at);
}
