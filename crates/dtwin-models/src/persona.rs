//! Persona and voice configuration.
//!
//! A persona bundles everything a generation run needs to know about
//! the character: the system prompt, the ElevenLabs voice, and the
//! HeyGen voice/avatar. It is resolved once at submission and passed
//! explicitly into each stage.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A resolved persona configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Persona {
    /// Display name
    pub name: String,

    /// Short biography shown to clients
    pub bio: String,

    /// System prompt driving text generation
    pub prompt: String,

    /// ElevenLabs voice for the synthesize_voice stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevenlabs_voice_id: Option<String>,

    /// HeyGen voice for the direct-voice-video variant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heygen_voice_id: Option<String>,

    /// HeyGen avatar for the render_video stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heygen_avatar_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// ElevenLabs voice rendering settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.75,
            similarity_boost: 0.75,
            style: 0.8,
            use_speaker_boost: true,
        }
    }
}
