//! Provider traits consumed by the pipeline.
//!
//! Each external collaborator sits behind one narrow async trait so
//! the orchestrator can be exercised against in-process fakes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use dtwin_models::{Persona, VoiceSettings};

use crate::error::ProviderResult;

/// Generated text plus provider metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTake {
    pub text: String,
    pub total_tokens: u32,
    pub latency_ms: u64,
}

/// A downloaded rendered video.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedVideo {
    /// Local path of the downloaded file
    pub path: PathBuf,
    /// Provider-side job id, kept for diagnostics
    pub video_id: String,
}

/// Speech-to-text provider.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an uploaded audio/video file into text.
    async fn transcribe(&self, media_path: &Path) -> ProviderResult<String>;
}

/// Text generation provider.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate the persona's hot take for the given pitch text.
    async fn generate(
        &self,
        text: &str,
        context: Option<&str>,
        persona: &Persona,
    ) -> ProviderResult<GeneratedTake>;
}

/// Text-to-speech provider.
#[async_trait]
pub trait VoiceSynthesizer: Send + Sync {
    /// Synthesize speech into `out_path` and return the written path.
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        settings: &VoiceSettings,
        out_path: &Path,
    ) -> ProviderResult<PathBuf>;
}

/// Avatar video rendering provider.
///
/// Rendering is asynchronous on the provider side: both calls submit a
/// render, poll the provider job until completion, and download the
/// result (typical completion latency is minutes).
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    /// Render a video lip-synced to a previously synthesized audio file.
    async fn render_from_audio(
        &self,
        audio_path: &Path,
        avatar_id: &str,
        out_path: &Path,
    ) -> ProviderResult<RenderedVideo>;

    /// Render a video using the platform's own text-to-speech voice.
    async fn render_from_text(
        &self,
        text: &str,
        avatar_id: &str,
        voice_id: &str,
        out_path: &Path,
    ) -> ProviderResult<RenderedVideo>;
}

/// Persona configuration lookup.
#[async_trait]
pub trait PersonaResolver: Send + Sync {
    /// Resolve a persona id into its full configuration.
    async fn resolve(&self, persona_id: &str) -> ProviderResult<Persona>;
}
