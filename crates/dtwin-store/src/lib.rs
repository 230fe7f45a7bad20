//! Durable/shared job storage.
//!
//! This crate provides:
//! - The `JobStore` contract used by the orchestrator and sweeper
//! - An in-memory backend (single process, data lost on restart)
//! - A Redis backend (multi-process, field-granular merge updates)
//! - Backend selection with a fail-fast multi-worker safety check

pub mod config;
pub mod error;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use config::{StoreBackend, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryJobStore;
pub use redis_store::RedisJobStore;
pub use store::JobStore;
