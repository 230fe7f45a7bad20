//! HeyGen avatar video client.
//!
//! Video generation is asynchronous on the provider side: a generate
//! request returns a provider video id, which is polled until the
//! render reaches `completed` or `failed`, then the finished file is
//! downloaded. Typical completion latency is 2-10 minutes.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::http::{check_response, stream_to_file};
use crate::traits::{RenderedVideo, VideoRenderer};

const DEFAULT_BASE_URL: &str = "https://api.heygen.com/v2";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(600);

/// HeyGen API client.
pub struct HeyGenClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl HeyGenClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("HEYGEN_API_KEY")
            .map_err(|_| ProviderError::Auth("HEYGEN_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Override the API base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the status poll cadence (tests).
    pub fn with_poll_interval(mut self, interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = interval;
        self.poll_timeout = timeout;
        self
    }

    /// Upload an audio asset, returning its provider-hosted URL.
    async fn upload_audio(&self, audio_path: &Path) -> ProviderResult<String> {
        let bytes = tokio::fs::read(audio_path).await?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("audio.mp3")
            .mime_str("audio/mpeg")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .http
            .post(format!("{}/assets/upload", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let resp = check_response(resp, "heygen").await?;
        let envelope: Envelope<UploadData> = resp.json().await?;
        let data = envelope.into_data("asset upload")?;
        Ok(data.url)
    }

    /// Submit a generate request, returning the provider video id.
    async fn submit_generate(&self, voice: serde_json::Value, avatar_id: &str) -> ProviderResult<String> {
        let body = json!({
            "video_inputs": [
                {
                    "character": {
                        "type": "avatar",
                        "avatar_id": avatar_id,
                        "avatar_style": "normal",
                    },
                    "voice": voice,
                    "background": { "type": "color", "value": "#1a1a1a" },
                }
            ],
            "dimension": { "width": 1920, "height": 1080 },
            "aspect_ratio": "16:9",
        });

        let resp = self
            .http
            .post(format!("{}/video/generate", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let resp = check_response(resp, "heygen").await?;
        let envelope: Envelope<GenerateData> = resp.json().await?;
        let data = envelope.into_data("video generate")?;

        debug!(video_id = %data.video_id, "Submitted HeyGen render");
        Ok(data.video_id)
    }

    /// Poll the provider job until it completes, returning the video URL.
    async fn poll_until_done(&self, video_id: &str) -> ProviderResult<String> {
        let deadline = Instant::now() + self.poll_timeout;

        loop {
            let resp = self
                .http
                .get(format!("{}/video/{}", self.base_url, video_id))
                .header("X-Api-Key", &self.api_key)
                .send()
                .await?;

            let resp = check_response(resp, "heygen").await?;
            let envelope: Envelope<StatusData> = resp.json().await?;
            let data = envelope.into_data("video status")?;

            match data.status.as_str() {
                "completed" => {
                    return data.video_url.ok_or_else(|| {
                        ProviderError::invalid_response("completed render has no video_url")
                    });
                }
                "failed" => {
                    return Err(ProviderError::RenderFailed(
                        data.error.unwrap_or_else(|| "unknown render error".into()),
                    ));
                }
                status => debug!(video_id, status, "Render still in progress"),
            }

            if Instant::now() >= deadline {
                return Err(ProviderError::PollTimeout(format!(
                    "video {} not done after {:?}",
                    video_id, self.poll_timeout
                )));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Poll and download the finished render.
    async fn finish_render(&self, video_id: String, out_path: &Path) -> ProviderResult<RenderedVideo> {
        let video_url = self.poll_until_done(&video_id).await?;

        let resp = self.http.get(&video_url).send().await?;
        let resp = check_response(resp, "heygen").await?;
        stream_to_file(resp, out_path).await?;

        info!(video_id = %video_id, path = %out_path.display(), "Video generated");
        Ok(RenderedVideo {
            path: out_path.to_path_buf(),
            video_id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self, what: &str) -> ProviderResult<T> {
        if let Some(error) = self.error {
            if !error.is_null() {
                return Err(ProviderError::invalid_response(format!(
                    "{} error: {}",
                    what, error
                )));
            }
        }
        self.data
            .ok_or_else(|| ProviderError::invalid_response(format!("{} returned no data", what)))
    }
}

#[derive(Debug, Default, Deserialize)]
struct UploadData {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateData {
    video_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct StatusData {
    status: String,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl VideoRenderer for HeyGenClient {
    async fn render_from_audio(
        &self,
        audio_path: &Path,
        avatar_id: &str,
        out_path: &Path,
    ) -> ProviderResult<RenderedVideo> {
        let audio_url = self.upload_audio(audio_path).await?;
        let voice = json!({ "type": "audio", "audio_url": audio_url });
        let video_id = self.submit_generate(voice, avatar_id).await?;
        self.finish_render(video_id, out_path).await
    }

    async fn render_from_text(
        &self,
        text: &str,
        avatar_id: &str,
        voice_id: &str,
        out_path: &Path,
    ) -> ProviderResult<RenderedVideo> {
        let voice = json!({ "type": "text", "input_text": text, "voice_id": voice_id });
        let video_id = self.submit_generate(voice, avatar_id).await?;
        self.finish_render(video_id, out_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_client(server: &MockServer) -> HeyGenClient {
        HeyGenClient::new("test-key")
            .with_base_url(server.uri())
            .with_poll_interval(Duration::from_millis(5), Duration::from_millis(500))
    }

    #[tokio::test]
    async fn test_render_from_text_polls_until_completed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/video/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": null,
                "data": { "video_id": "vid-1" }
            })))
            .mount(&server)
            .await;

        // First poll reports processing, subsequent polls completed
        Mock::given(method("GET"))
            .and(path("/video/vid-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": null,
                "data": { "status": "processing" }
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/video/vid-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": null,
                "data": {
                    "status": "completed",
                    "video_url": format!("{}/download/vid-1.mp4", server.uri())
                }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/download/vid-1.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake-mp4".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("take.mp4");

        let rendered = fast_client(&server)
            .render_from_text("hot take", "avatar-1", "voice-1", &out_path)
            .await
            .unwrap();

        assert_eq!(rendered.video_id, "vid-1");
        assert_eq!(rendered.path, out_path);
        assert_eq!(tokio::fs::read(&out_path).await.unwrap(), b"fake-mp4");
    }

    #[tokio::test]
    async fn test_render_failure_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/video/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": null,
                "data": { "video_id": "vid-2" }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/video/vid-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": null,
                "data": { "status": "failed", "error": "avatar not found" }
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = fast_client(&server)
            .render_from_text("hot take", "bad-avatar", "voice-1", &dir.path().join("v.mp4"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::RenderFailed(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_poll_timeout_is_retryable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/video/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": null,
                "data": { "video_id": "vid-3" }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/video/vid-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": null,
                "data": { "status": "processing" }
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = HeyGenClient::new("test-key")
            .with_base_url(server.uri())
            .with_poll_interval(Duration::from_millis(5), Duration::from_millis(20));

        let err = client
            .render_from_text("hot take", "avatar-1", "voice-1", &dir.path().join("v.mp4"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::PollTimeout(_)));
        assert!(err.is_retryable());
    }
}
