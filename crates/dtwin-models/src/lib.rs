//! Shared data models for the Digital Twin backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job records, statuses, and partial updates
//! - Pipeline stages and workflow variants
//! - Stage outputs (transcript, generated text, audio, video)
//! - Persona and voice configuration

pub mod job;
pub mod outputs;
pub mod persona;
pub mod workflow;

// Re-export common types
pub use job::{JobId, JobInputs, JobRecord, JobStatus, JobUpdate};
pub use outputs::{StageOutput, StageOutputs};
pub use persona::{Persona, VoiceSettings};
pub use workflow::{InputError, Stage, WorkflowVariant};
