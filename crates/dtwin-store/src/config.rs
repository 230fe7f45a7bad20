//! Store backend selection.
//!
//! A process-local map cannot be observed by sibling workers, which
//! silently breaks job polling: worker A creates the job, worker B
//! answers the poll and has never heard of it. Backend selection
//! therefore fails fast at startup when the in-memory backend is
//! combined with more than one worker process.

use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryJobStore;
use crate::redis_store::RedisJobStore;
use crate::store::JobStore;

/// Which job store backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Single process, data lost on restart, zero external dependency
    #[default]
    Memory,
    /// Multi-process durable store, requires a reachable Redis
    Redis,
}

impl StoreBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Some(StoreBackend::Memory),
            "redis" => Some(StoreBackend::Redis),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Redis => "redis",
        }
    }
}

/// Job store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub redis_url: String,
    /// Number of worker processes in this deployment
    pub worker_count: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            redis_url: "redis://localhost:6379".to_string(),
            worker_count: 1,
        }
    }
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let backend = match std::env::var("JOB_STORE") {
            Ok(raw) => StoreBackend::parse(&raw).ok_or_else(|| {
                StoreError::config(format!(
                    "unknown JOB_STORE '{}', expected 'memory' or 'redis'",
                    raw
                ))
            })?,
            Err(_) => StoreBackend::Memory,
        };

        Ok(Self {
            backend,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            worker_count: std::env::var("WORKER_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
        })
    }

    /// Fail-fast startup invariant: the in-memory backend is rejected
    /// outright when more than one worker process is configured.
    pub fn validate(&self) -> StoreResult<()> {
        if self.backend == StoreBackend::Memory && self.worker_count > 1 {
            return Err(StoreError::config(format!(
                "cannot use the in-memory job store with {} worker processes; \
                 set JOB_STORE=redis and ensure Redis is running",
                self.worker_count
            )));
        }
        Ok(())
    }

    /// Validate and construct the selected backend.
    pub async fn connect(&self) -> StoreResult<Arc<dyn JobStore>> {
        self.validate()?;
        match self.backend {
            StoreBackend::Memory => Ok(Arc::new(MemoryJobStore::new())),
            StoreBackend::Redis => Ok(Arc::new(RedisJobStore::connect(&self.redis_url).await?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_rejected_with_multiple_workers() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            worker_count: 2,
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn test_memory_backend_allowed_with_single_worker() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_redis_backend_allowed_with_multiple_workers() {
        let config = StoreConfig {
            backend: StoreBackend::Redis,
            worker_count: 4,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_connect_rejects_unsafe_config_before_backend_construction() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            worker_count: 3,
            ..Default::default()
        };
        let err = config.connect().await.unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(StoreBackend::parse("memory"), Some(StoreBackend::Memory));
        assert_eq!(StoreBackend::parse("Redis"), Some(StoreBackend::Redis));
        assert_eq!(StoreBackend::parse("firestore"), None);
    }
}
