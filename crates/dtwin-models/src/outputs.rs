//! Stage output payloads.
//!
//! Outputs are append-only: once a stage has succeeded its output is
//! never overwritten within the same job execution. Insertion order is
//! preserved so polling clients see outputs in pipeline order.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::workflow::Stage;

/// Result payload produced by one pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageOutput {
    /// Transcript of the uploaded media
    Transcript { text: String },
    /// Generated hot take with provider metrics
    GeneratedText {
        text: String,
        total_tokens: u32,
        latency_ms: u64,
    },
    /// Synthesized speech file
    Audio { path: String },
    /// Rendered avatar video file
    Video {
        path: String,
        provider_video_id: String,
    },
}

impl StageOutput {
    /// The generated text, if this is a `GeneratedText` output.
    pub fn generated_text(&self) -> Option<&str> {
        match self {
            StageOutput::GeneratedText { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The transcript text, if this is a `Transcript` output.
    pub fn transcript_text(&self) -> Option<&str> {
        match self {
            StageOutput::Transcript { text } => Some(text),
            _ => None,
        }
    }

    /// The audio file path, if this is an `Audio` output.
    pub fn audio_path(&self) -> Option<&str> {
        match self {
            StageOutput::Audio { path } => Some(path),
            _ => None,
        }
    }
}

/// Insertion-ordered, write-once-per-stage output collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct StageOutputs(Vec<(Stage, StageOutput)>);

impl StageOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an output for a stage.
    ///
    /// Returns `false` without modifying the collection if the stage
    /// already has an output.
    pub fn insert(&mut self, stage: Stage, output: StageOutput) -> bool {
        if self.contains(stage) {
            return false;
        }
        self.0.push((stage, output));
        true
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.0.iter().any(|(s, _)| *s == stage)
    }

    pub fn get(&self, stage: Stage) -> Option<&StageOutput> {
        self.0.iter().find(|(s, _)| *s == stage).map(|(_, o)| o)
    }

    /// Outputs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &StageOutput)> {
        self.0.iter().map(|(s, o)| (*s, o))
    }

    /// Stage names in insertion order.
    pub fn stages(&self) -> Vec<Stage> {
        self.0.iter().map(|(s, _)| *s).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
