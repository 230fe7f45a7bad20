//! Provider error types and retryability classification.

use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur calling an external provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Rate limited{}", .retry_after_ms.map(|ms| format!(", retry after {}ms", ms)).unwrap_or_default())]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("API request failed ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Provider-side render failed: {0}")]
    RenderFailed(String),

    #[error("Timed out polling provider job: {0}")]
    PollTimeout(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Classify an HTTP error status.
    ///
    /// 429 is retryable rate limiting, 401/403 are permanent auth
    /// failures, 5xx are retryable server errors, every other 4xx is a
    /// permanent request error.
    pub fn from_http_status(status: u16, message: impl Into<String>, retry_after_ms: Option<u64>) -> Self {
        let message = message.into();
        match status {
            429 => Self::RateLimited { retry_after_ms },
            401 | 403 => Self::Auth(message),
            s if s >= 500 => Self::Api {
                status: s,
                message,
                retryable: true,
            },
            s => Self::Api {
                status: s,
                message,
                retryable: false,
            },
        }
    }

    /// Check if error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. }
            | ProviderError::Network(_)
            | ProviderError::PollTimeout(_) => true,
            ProviderError::Api { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// Suggested delay before the next attempt, when the provider told us.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => *retry_after_ms,
            _ => None,
        }
    }
}
