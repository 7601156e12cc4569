//! The cache backend boundary.
//!
//! Backends are plain key/value stores with per-entry expiry. They know
//! nothing about posts; `PostListCache` layers the listing protocol on top.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use super::config::{CacheBackendKind, CacheConfig};
use super::{MemoryBackend, NullBackend, RedisBackend};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache `{op}` timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cached value could not be encoded or decoded: {0}")]
    Codec(String),
    #[error("cache misconfigured: {0}")]
    Configuration(String),
}

impl CacheError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheError::Unavailable(_) => "unavailable",
            CacheError::Timeout { .. } => "timeout",
            CacheError::Backend(_) => "backend",
            CacheError::Codec(_) => "codec",
            CacheError::Configuration(_) => "configuration",
        }
    }
}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// The stored value, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    /// Replace the value and its expiry in one step.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;

    /// Remove the value. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Outcome of a cache read.
///
/// `Miss` and `BackendError` lead to the same fallback; the error is kept so
/// the caller can log and count it.
#[derive(Debug)]
pub enum CacheLookup<T = Bytes> {
    Hit(T),
    Miss,
    BackendError(CacheError),
}

impl<T> From<Result<Option<T>, CacheError>> for CacheLookup<T> {
    fn from(result: Result<Option<T>, CacheError>) -> Self {
        match result {
            Ok(Some(value)) => CacheLookup::Hit(value),
            Ok(None) => CacheLookup::Miss,
            Err(err) => CacheLookup::BackendError(err),
        }
    }
}

/// Build the backend selected by `config`.
///
/// The Redis backend connects lazily, so an unreachable server at startup
/// only degrades reads to misses.
pub fn build_backend(config: &CacheConfig) -> Result<Arc<dyn CacheBackend>, CacheError> {
    match config.backend {
        CacheBackendKind::Memory => Ok(Arc::new(MemoryBackend::new())),
        CacheBackendKind::None => Ok(Arc::new(NullBackend)),
        CacheBackendKind::Redis => {
            let url = config.redis_url.as_deref().ok_or_else(|| {
                CacheError::Configuration("redis backend requires cache.redis_url".to_string())
            })?;
            Ok(Arc::new(RedisBackend::open(url)?))
        }
    }
}
