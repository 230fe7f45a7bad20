//! Stage executors.
//!
//! `StageRunner` turns a `(record, stage)` pair into a `StageOutput`,
//! wiring each stage's inputs from the job record and earlier outputs.
//! Every attempt runs under a per-stage wall-clock timeout; retryable
//! failures go back through the retry loop.

use std::path::Path;
use std::sync::Arc;

use dtwin_models::{JobRecord, Persona, Stage, StageOutput, WorkflowVariant};
use dtwin_providers::{
    ElevenLabsClient, FilePersonaResolver, HeyGenClient, OpenAiClient, PersonaResolver,
    ProviderResult, TextGenerator, Transcriber, VideoRenderer, VoiceSynthesizer,
};

use crate::config::PipelineConfig;
use crate::error::StageError;
use crate::retry::retry_stage;

const AUDIO_FILE: &str = "take.mp3";
const VIDEO_FILE: &str = "take.mp4";

/// The full set of external collaborators.
#[derive(Clone)]
pub struct Providers {
    pub transcriber: Arc<dyn Transcriber>,
    pub generator: Arc<dyn TextGenerator>,
    pub voice: Arc<dyn VoiceSynthesizer>,
    pub video: Arc<dyn VideoRenderer>,
    pub personas: Arc<dyn PersonaResolver>,
}

impl Providers {
    /// Wire up the production providers from environment variables.
    pub fn from_env(personas_dir: &Path) -> ProviderResult<Self> {
        let openai = Arc::new(OpenAiClient::from_env()?);
        Ok(Self {
            transcriber: openai.clone(),
            generator: openai,
            voice: Arc::new(ElevenLabsClient::from_env()?),
            video: Arc::new(HeyGenClient::from_env()?),
            personas: Arc::new(FilePersonaResolver::load(personas_dir)?),
        })
    }
}

/// Runs individual pipeline stages against the providers.
pub struct StageRunner {
    providers: Providers,
    config: PipelineConfig,
}

impl StageRunner {
    pub fn new(providers: Providers, config: PipelineConfig) -> Self {
        Self { providers, config }
    }

    /// Run one stage to completion, with timeout and retry.
    pub async fn run_stage(
        &self,
        record: &JobRecord,
        persona: &Persona,
        stage: Stage,
        work_dir: &Path,
    ) -> Result<StageOutput, StageError> {
        let limit = self.config.timeout_for(stage);

        retry_stage(&self.config.retry, || async {
            match tokio::time::timeout(limit, self.attempt(record, persona, stage, work_dir)).await
            {
                Ok(result) => result,
                Err(_) => Err(StageError::timeout(stage, limit)),
            }
        })
        .await
    }

    /// One attempt of one stage.
    async fn attempt(
        &self,
        record: &JobRecord,
        persona: &Persona,
        stage: Stage,
        work_dir: &Path,
    ) -> Result<StageOutput, StageError> {
        match stage {
            Stage::Transcribe => self.transcribe(record, stage).await,
            Stage::GenerateText => self.generate_text(record, persona, stage).await,
            Stage::SynthesizeVoice => {
                self.synthesize_voice(record, persona, stage, work_dir).await
            }
            Stage::RenderVideo => self.render_video(record, persona, stage, work_dir).await,
        }
    }

    async fn transcribe(&self, record: &JobRecord, stage: Stage) -> Result<StageOutput, StageError> {
        let media_ref = record
            .inputs
            .media_ref
            .as_deref()
            .ok_or_else(|| StageError::permanent(stage, "no media file on record"))?;

        let text = self
            .providers
            .transcriber
            .transcribe(Path::new(media_ref))
            .await
            .map_err(|e| StageError::from_provider(stage, &e))?;

        Ok(StageOutput::Transcript { text })
    }

    async fn generate_text(
        &self,
        record: &JobRecord,
        persona: &Persona,
        stage: Stage,
    ) -> Result<StageOutput, StageError> {
        // The transcript wins over raw text when both exist
        let source = record
            .outputs
            .get(Stage::Transcribe)
            .and_then(|o| o.transcript_text())
            .or(record.inputs.text.as_deref())
            .ok_or_else(|| StageError::permanent(stage, "no input text available"))?;

        let take = self
            .providers
            .generator
            .generate(source, record.inputs.context.as_deref(), persona)
            .await
            .map_err(|e| StageError::from_provider(stage, &e))?;

        Ok(StageOutput::GeneratedText {
            text: take.text,
            total_tokens: take.total_tokens,
            latency_ms: take.latency_ms,
        })
    }

    async fn synthesize_voice(
        &self,
        record: &JobRecord,
        persona: &Persona,
        stage: Stage,
        work_dir: &Path,
    ) -> Result<StageOutput, StageError> {
        let text = record
            .outputs
            .get(Stage::GenerateText)
            .and_then(|o| o.generated_text())
            .ok_or_else(|| StageError::permanent(stage, "generated text not available"))?;

        let voice_id = persona.elevenlabs_voice_id.as_deref().ok_or_else(|| {
            StageError::permanent(
                stage,
                format!("persona '{}' has no synthesis voice configured", persona.name),
            )
        })?;

        let settings = record.inputs.voice_settings.clone().unwrap_or_default();
        let out_path = work_dir.join(AUDIO_FILE);

        let written = self
            .providers
            .voice
            .synthesize(text, voice_id, &settings, &out_path)
            .await
            .map_err(|e| StageError::from_provider(stage, &e))?;

        Ok(StageOutput::Audio {
            path: written.display().to_string(),
        })
    }

    async fn render_video(
        &self,
        record: &JobRecord,
        persona: &Persona,
        stage: Stage,
        work_dir: &Path,
    ) -> Result<StageOutput, StageError> {
        let avatar_id = record
            .inputs
            .avatar_override
            .as_deref()
            .or(persona.heygen_avatar_id.as_deref())
            .ok_or_else(|| {
                StageError::permanent(
                    stage,
                    format!("persona '{}' has no avatar configured", persona.name),
                )
            })?;

        let out_path = work_dir.join(VIDEO_FILE);

        let rendered = if record.inputs.variant == WorkflowVariant::DirectVoiceVideo {
            let text = record
                .outputs
                .get(Stage::GenerateText)
                .and_then(|o| o.generated_text())
                .ok_or_else(|| StageError::permanent(stage, "generated text not available"))?;

            let voice_id = persona.heygen_voice_id.as_deref().ok_or_else(|| {
                StageError::permanent(
                    stage,
                    format!("persona '{}' has no platform voice configured", persona.name),
                )
            })?;

            self.providers
                .video
                .render_from_text(text, avatar_id, voice_id, &out_path)
                .await
        } else {
            let audio_path = record
                .outputs
                .get(Stage::SynthesizeVoice)
                .and_then(|o| o.audio_path())
                .ok_or_else(|| StageError::permanent(stage, "synthesized audio not available"))?;

            self.providers
                .video
                .render_from_audio(Path::new(audio_path), avatar_id, &out_path)
                .await
        };

        let rendered = rendered.map_err(|e| StageError::from_provider(stage, &e))?;

        Ok(StageOutput::Video {
            path: rendered.path.display().to_string(),
            provider_video_id: rendered.video_id,
        })
    }
}
