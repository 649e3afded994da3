//! Key-value store abstraction
//!
//! Every piece of shared state (cached result lists, in-flight markers,
//! session records, result pointers, the job queue and the catalog caches)
//! lives behind [`KeyValueStore`]. Two backends exist:
//!
//! - [`RedisStore`]: the production backend, shared by the server and any
//!   number of worker processes
//! - [`MemoryStore`]: a process-local backend for tests and single-process
//!   deployments
//!
//! Expiry semantics follow Redis: writing a value replaces any previous
//! TTL, appending to a list keeps it, and an expired key behaves exactly like
//! a missing one.

use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use thiserror::Error;

use crate::config::{StoreBackend, StoreConfig};

pub mod keys;
mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Key '{0}' holds a value of the wrong type")]
    WrongType(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Shared handle used by handlers and workers
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Redis-compatible subset of operations used by doRiNA
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Round trip to the backend
    async fn ping(&self) -> StoreResult<()>;

    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value that expires after `ttl`
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Write only if the key is absent. Returns whether the write happened.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool>;

    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Reset the TTL of an existing key. Returns false when the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool>;

    /// Remaining lifetime, `None` when the key is absent or never expires
    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>>;

    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Append values to a list, returning its new length
    async fn rpush(&self, key: &str, values: &[String]) -> StoreResult<usize>;

    async fn lpop(&self, key: &str) -> StoreResult<Option<String>>;

    /// Inclusive range with Redis index semantics (negative counts from the end)
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>>;

    async fn llen(&self, key: &str) -> StoreResult<usize>;

    /// Add members to a lexicographically ordered set
    async fn zadd(&self, key: &str, members: &[String]) -> StoreResult<usize>;

    /// Members between two lex bounds (`-`, `+`, `[x` or `(x`)
    async fn zrangebylex(
        &self,
        key: &str,
        min: &str,
        max: &str,
        limit: Option<usize>,
    ) -> StoreResult<Vec<String>>;

    /// Every live key starting with `prefix`. The memory backend also drops
    /// all expired keys while answering.
    async fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;
}

/// Open the configured backend
pub async fn connect(config: &StoreConfig) -> StoreResult<SharedStore> {
    match config.backend {
        StoreBackend::Redis => {
            let store = RedisStore::connect(&config.redis_url).await?;
            tracing::info!(url = %config.redis_url, "Connected to redis store");
            Ok(Arc::new(store))
        },
        StoreBackend::Memory => {
            tracing::info!("Using in-process memory store");
            Ok(Arc::new(MemoryStore::new()))
        },
    }
}

/// Whole seconds for an expiry, never zero
pub(crate) fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}
