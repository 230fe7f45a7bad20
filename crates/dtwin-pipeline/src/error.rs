//! Pipeline error types.

use thiserror::Error;

use dtwin_models::{InputError, Stage};
use dtwin_providers::ProviderError;
use dtwin_store::StoreError;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failure surfaced from `submit`/`get_status`.
///
/// Failures inside a running job never surface here; they end up on the
/// job record as a terminal `failed` status instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid submission: {0}")]
    InvalidInput(#[from] InputError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl PipelineError {
    /// True if the error should map to a 404-style "unknown id" response.
    pub fn is_not_found(&self) -> bool {
        match self {
            PipelineError::Store(e) => e.is_not_found(),
            PipelineError::Provider(ProviderError::NotFound(_)) => true,
            _ => false,
        }
    }
}

/// A stage attempt failure, classified for the retry loop.
#[derive(Debug, Clone, Error)]
#[error("stage {stage} failed: {message}")]
pub struct StageError {
    /// The stage that failed
    pub stage: Stage,
    /// Human-readable description, persisted on the job record
    pub message: String,
    /// Whether another attempt could plausibly succeed
    pub retryable: bool,
    /// Provider-requested minimum wait before the next attempt
    pub retry_after_ms: Option<u64>,
}

impl StageError {
    /// Classify a provider failure.
    pub fn from_provider(stage: Stage, err: &ProviderError) -> Self {
        Self {
            stage,
            message: err.to_string(),
            retryable: err.is_retryable(),
            retry_after_ms: err.retry_after_ms(),
        }
    }

    /// An attempt that hit its wall-clock timeout. Always retryable.
    pub fn timeout(stage: Stage, limit: std::time::Duration) -> Self {
        Self {
            stage,
            message: format!("timed out after {:?}", limit),
            retryable: true,
            retry_after_ms: None,
        }
    }

    /// A failure no retry can fix (missing input, bad configuration).
    pub fn permanent(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            retryable: false,
            retry_after_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_classification_carries_through() {
        let rate_limited = ProviderError::RateLimited {
            retry_after_ms: Some(2000),
        };
        let err = StageError::from_provider(Stage::GenerateText, &rate_limited);
        assert!(err.retryable);
        assert_eq!(err.retry_after_ms, Some(2000));

        let auth = ProviderError::Auth("bad key".into());
        let err = StageError::from_provider(Stage::GenerateText, &auth);
        assert!(!err.retryable);
    }

    #[test]
    fn test_timeout_is_retryable() {
        let err = StageError::timeout(Stage::RenderVideo, std::time::Duration::from_secs(900));
        assert!(err.retryable);
        assert_eq!(err.stage, Stage::RenderVideo);
    }
}
