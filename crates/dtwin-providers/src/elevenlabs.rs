//! ElevenLabs text-to-speech client.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use dtwin_models::VoiceSettings;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{check_response, stream_to_file};
use crate::traits::VoiceSynthesizer;

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
const MODEL_ID: &str = "eleven_multilingual_v2";
const OUTPUT_FORMAT: &str = "mp3_44100_128";

/// ElevenLabs API client.
pub struct ElevenLabsClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ElevenLabsClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("ELEVENLABS_API_KEY")
            .map_err(|_| ProviderError::Auth("ELEVENLABS_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Override the API base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl VoiceSynthesizer for ElevenLabsClient {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        settings: &VoiceSettings,
        out_path: &Path,
    ) -> ProviderResult<PathBuf> {
        let body = json!({
            "text": text,
            "model_id": MODEL_ID,
            "voice_settings": {
                "stability": settings.stability,
                "similarity_boost": settings.similarity_boost,
                "style": settings.style,
                "use_speaker_boost": settings.use_speaker_boost,
            },
        });

        let resp = self
            .http
            .post(format!(
                "{}/v1/text-to-speech/{}?output_format={}",
                self.base_url, voice_id, OUTPUT_FORMAT
            ))
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let resp = check_response(resp, "elevenlabs").await?;
        stream_to_file(resp, out_path).await?;

        info!(voice_id, path = %out_path.display(), "Audio generated");
        Ok(out_path.to_path_buf())
    }
}
