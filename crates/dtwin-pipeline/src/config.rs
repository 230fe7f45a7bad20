//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use dtwin_models::Stage;

use crate::retry::RetryConfig;

/// Tunables for stage execution and background cleanup.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory for generated audio/video files (one subdir per job)
    pub output_dir: PathBuf,

    /// Wall-clock limit per transcription attempt
    pub transcribe_timeout: Duration,
    /// Wall-clock limit per text-generation attempt
    pub generate_timeout: Duration,
    /// Wall-clock limit per voice-synthesis attempt
    pub synthesize_timeout: Duration,
    /// Wall-clock limit per video-render attempt (covers provider polling)
    pub render_timeout: Duration,

    /// Retry policy shared by all stages
    pub retry: RetryConfig,

    /// How often the cleanup sweeper runs
    pub sweep_interval: Duration,
    /// Terminal jobs older than this are evicted
    pub job_max_age: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            transcribe_timeout: Duration::from_secs(120),
            generate_timeout: Duration::from_secs(60),
            synthesize_timeout: Duration::from_secs(120),
            render_timeout: Duration::from_secs(900),
            retry: RetryConfig::default(),
            sweep_interval: Duration::from_secs(3600),
            job_max_age: Duration::from_secs(24 * 3600),
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl PipelineConfig {
    /// Load configuration from environment variables, with defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(t) = env_secs("TRANSCRIBE_TIMEOUT_SECS") {
            config.transcribe_timeout = t;
        }
        if let Some(t) = env_secs("GENERATE_TIMEOUT_SECS") {
            config.generate_timeout = t;
        }
        if let Some(t) = env_secs("SYNTHESIZE_TIMEOUT_SECS") {
            config.synthesize_timeout = t;
        }
        if let Some(t) = env_secs("RENDER_TIMEOUT_SECS") {
            config.render_timeout = t;
        }
        if let Ok(n) = std::env::var("STAGE_MAX_RETRIES") {
            if let Ok(n) = n.parse::<u32>() {
                config.retry = config.retry.with_max_retries(n);
            }
        }
        if let Some(t) = env_secs("CLEANUP_INTERVAL_SECS") {
            config.sweep_interval = t;
        }
        if let Some(t) = env_secs("JOB_MAX_AGE_SECS") {
            config.job_max_age = t;
        }

        config
    }

    /// The wall-clock limit for one attempt of the given stage.
    pub fn timeout_for(&self, stage: Stage) -> Duration {
        match stage {
            Stage::Transcribe => self.transcribe_timeout,
            Stage::GenerateText => self.generate_timeout,
            Stage::SynthesizeVoice => self.synthesize_timeout,
            Stage::RenderVideo => self.render_timeout,
        }
    }
}
