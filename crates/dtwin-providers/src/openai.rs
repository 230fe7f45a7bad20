//! OpenAI client: Whisper transcription and chat-completion generation.

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use dtwin_models::Persona;

use crate::error::{ProviderError, ProviderResult};
use crate::http::check_response;
use crate::traits::{GeneratedTake, TextGenerator, Transcriber};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
const TRANSCRIBE_MODEL: &str = "whisper-1";

/// File extensions Whisper accepts directly (audio and video containers).
const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "flac", "ogg", "webm", "mp4"];

/// OpenAI API client.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    chat_model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::Auth("OPENAI_API_KEY not set".into()))?;

        let mut client = Self::new(api_key);
        if let Ok(model) = std::env::var("OPENAI_CHAT_MODEL") {
            client.chat_model = model;
        }
        Ok(client)
    }

    /// Override the API base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(&self, media_path: &Path) -> ProviderResult<String> {
        let extension = media_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ProviderError::invalid_input(format!(
                "unsupported file format: .{}",
                extension
            )));
        }

        let file_name = media_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let bytes = tokio::fs::read(media_path).await?;
        debug!(file = %file_name, size = bytes.len(), "Uploading media for transcription");

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", TRANSCRIBE_MODEL)
            .text("response_format", "text");

        let resp = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let resp = check_response(resp, "openai").await?;
        let transcript = resp.text().await?.trim().to_string();

        info!(chars = transcript.len(), "Transcript generated");
        Ok(transcript)
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(
        &self,
        text: &str,
        context: Option<&str>,
        persona: &Persona,
    ) -> ProviderResult<GeneratedTake> {
        let mut user_message = format!("Here's a startup pitch I just heard:\n\n{}", text);
        if let Some(context) = context {
            user_message.push_str(&format!("\n\nAdditional context: {}", context));
        }
        user_message.push_str("\n\nGive me your hot take!");

        let body = json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": persona.prompt },
                { "role": "user", "content": user_message },
            ],
            "max_tokens": 800,
            "temperature": 0.8,
            "presence_penalty": 0.1,
            "frequency_penalty": 0.1,
        });

        let started = Instant::now();
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let resp = check_response(resp, "openai").await?;
        let parsed: ChatResponse = resp.json().await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::invalid_response("no choices in chat completion"))?;

        let total_tokens = parsed.usage.map(|u| u.total_tokens).unwrap_or(0);

        info!(
            persona = %persona.name,
            tokens = total_tokens,
            latency_ms,
            "Hot take generated"
        );

        Ok(GeneratedTake {
            text: content.trim().to_string(),
            total_tokens,
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn persona() -> Persona {
        Persona {
            name: "Chad Goldstein".into(),
            bio: "VC".into(),
            prompt: "You are Chad.".into(),
            elevenlabs_voice_id: None,
            heygen_voice_id: None,
            heygen_avatar_id: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_generate_parses_text_and_usage() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "  Bold pitch. Verdict: pass.  " } }
                ],
                "usage": { "prompt_tokens": 50, "completion_tokens": 70, "total_tokens": 120 }
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new("test-key").with_base_url(server.uri());
        let take = client.generate("pitch", None, &persona()).await.unwrap();

        assert_eq!(take.text, "Bold pitch. Verdict: pass.");
        assert_eq!(take.total_tokens, 120);
    }

    #[tokio::test]
    async fn test_generate_maps_429_to_rate_limited() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "3")
                    .set_body_string("rate limited"),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new("test-key").with_base_url(server.uri());
        let err = client.generate("pitch", None, &persona()).await.unwrap_err();

        assert!(matches!(err, ProviderError::RateLimited { .. }));
        assert_eq!(err.retry_after_ms(), Some(3000));
    }

    #[tokio::test]
    async fn test_generate_maps_401_to_auth() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new("bad-key").with_base_url(server.uri());
        let err = client.generate("pitch", None, &persona()).await.unwrap_err();

        assert!(matches!(err, ProviderError::Auth(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_transcribe_rejects_unsupported_extension() {
        let client = OpenAiClient::new("test-key");
        let err = client
            .transcribe(Path::new("/tmp/input.docx"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::InvalidInput(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_transcribe_returns_trimmed_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello world\n"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("pitch.mp3");
        tokio::fs::write(&media, b"fake audio").await.unwrap();

        let client = OpenAiClient::new("test-key").with_base_url(server.uri());
        let transcript = client.transcribe(&media).await.unwrap();

        assert_eq!(transcript, "hello world");
    }
}
