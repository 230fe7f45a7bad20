//! External AI provider clients.
//!
//! This crate provides:
//! - Async traits for the four external collaborators (transcription,
//!   text generation, voice synthesis, video rendering) plus persona
//!   resolution
//! - HTTP implementations for OpenAI, ElevenLabs, and HeyGen
//! - A file-backed persona resolver
//! - Error classification (retryable vs. permanent) for the pipeline's
//!   retry policy

pub mod elevenlabs;
pub mod error;
pub mod heygen;
mod http;
pub mod openai;
pub mod persona_file;
pub mod traits;

pub use elevenlabs::ElevenLabsClient;
pub use error::{ProviderError, ProviderResult};
pub use heygen::HeyGenClient;
pub use openai::OpenAiClient;
pub use persona_file::FilePersonaResolver;
pub use traits::{
    GeneratedTake, PersonaResolver, RenderedVideo, TextGenerator, Transcriber, VideoRenderer,
    VoiceSynthesizer,
};
