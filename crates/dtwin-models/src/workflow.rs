//! Pipeline stages and workflow variants.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One step of the generation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Transcribe uploaded audio/video into text
    Transcribe,
    /// Generate the persona's hot take from text
    GenerateText,
    /// Synthesize speech for the generated text
    SynthesizeVoice,
    /// Render the avatar video
    RenderVideo,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Transcribe => "transcribe",
            Stage::GenerateText => "generate_text",
            Stage::SynthesizeVoice => "synthesize_voice",
            Stage::RenderVideo => "render_video",
        }
    }

    /// Parse from the snake_case wire form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "transcribe" => Some(Stage::Transcribe),
            "generate_text" => Some(Stage::GenerateText),
            "synthesize_voice" => Some(Stage::SynthesizeVoice),
            "render_video" => Some(Stage::RenderVideo),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Workflow variant selected at submission time.
///
/// Each variant is a fixed ordered stage list over the same state
/// machine. `DirectVoiceVideo` does not skip a step silently: its final
/// stage is `RenderVideo` parameterized to use the video platform's own
/// text-to-speech instead of the separate `SynthesizeVoice` stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowVariant {
    /// Transcribe → generate_text → synthesize_voice → render_video
    Full,
    /// Generate_text → synthesize_voice → render_video (raw text input)
    #[default]
    TextOnly,
    /// Generate_text → render_video with platform-side voice
    DirectVoiceVideo,
}

impl WorkflowVariant {
    /// The ordered stage list for this variant.
    pub fn stages(&self) -> &'static [Stage] {
        match self {
            WorkflowVariant::Full => &[
                Stage::Transcribe,
                Stage::GenerateText,
                Stage::SynthesizeVoice,
                Stage::RenderVideo,
            ],
            WorkflowVariant::TextOnly => &[
                Stage::GenerateText,
                Stage::SynthesizeVoice,
                Stage::RenderVideo,
            ],
            WorkflowVariant::DirectVoiceVideo => &[Stage::GenerateText, Stage::RenderVideo],
        }
    }

    /// True if this variant starts from an uploaded media file.
    pub fn requires_media(&self) -> bool {
        matches!(self, WorkflowVariant::Full)
    }

    /// True if this variant starts from raw text.
    pub fn requires_text(&self) -> bool {
        matches!(
            self,
            WorkflowVariant::TextOnly | WorkflowVariant::DirectVoiceVideo
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowVariant::Full => "full",
            WorkflowVariant::TextOnly => "text_only",
            WorkflowVariant::DirectVoiceVideo => "direct_voice_video",
        }
    }
}

impl fmt::Display for WorkflowVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Submission input validation failure.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("workflow variant '{0}' requires an uploaded media file")]
    MissingMedia(WorkflowVariant),

    #[error("workflow variant '{0}' requires input text")]
    MissingText(WorkflowVariant),
}
