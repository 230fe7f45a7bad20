//! Pipeline orchestration.
//!
//! This crate drives jobs through their workflow's stage list:
//! - `Orchestrator` validates submissions, persists records, and spawns
//!   per-job execution tasks
//! - `StageRunner` executes individual stages against the provider
//!   traits, with per-stage timeouts and bounded retry
//! - `CleanupSweeper` evicts terminal jobs past their retention age

pub mod config;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod retry;
pub mod stages;
pub mod sweeper;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult, StageError};
pub use orchestrator::Orchestrator;
pub use retry::RetryConfig;
pub use stages::{Providers, StageRunner};
pub use sweeper::CleanupSweeper;
