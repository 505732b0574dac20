//! Circuit-breaker decorator over any storage backend.
//!
//! Each logical operation gets its own breaker so a failing listing does
//! not block ranged reads. The wrapper never retries; it either passes the
//! call through or fails fast with [`StorageError::Unavailable`].

use async_trait::async_trait;
use bytes::Bytes;

use super::{
    CircuitBreaker, CircuitBreakerConfig, Result, StorageBackend, StorageError,
};

/// Wraps a backend with one circuit breaker per operation.
pub struct ResilientBackend<B> {
    inner: B,
    read_chunk: CircuitBreaker,
    size: CircuitBreaker,
    list_keys: CircuitBreaker,
}

impl<B: StorageBackend> ResilientBackend<B> {
    pub fn new(inner: B, config: CircuitBreakerConfig) -> Self {
        Self {
            inner,
            read_chunk: CircuitBreaker::new("read_chunk", config.clone()),
            size: CircuitBreaker::new("size", config.clone()),
            list_keys: CircuitBreaker::new("list_keys", config),
        }
    }

    /// Classify a backend result for the breaker and convert failures.
    ///
    /// `NotFound` and `InvalidKey` pass through untouched: a missing key
    /// says nothing about backend health and must stay distinguishable from
    /// an outage. `Io` and `Unavailable` count as failures and surface as
    /// `Unavailable` carrying the original cause.
    fn observe<T>(breaker: &CircuitBreaker, result: Result<T>) -> Result<T> {
        match result {
            Ok(v) => {
                breaker.record_success();
                Ok(v)
            }
            Err(e @ (StorageError::NotFound { .. } | StorageError::InvalidKey { .. })) => {
                breaker.record_success();
                Err(e)
            }
            Err(e) => {
                breaker.record_failure();
                Err(StorageError::unavailable(
                    "backend call failed",
                    Some(Box::new(e)),
                ))
            }
        }
    }

    fn short_circuit<T>() -> Result<T> {
        Err(StorageError::unavailable("circuit open", None))
    }
}

#[async_trait]
impl<B: StorageBackend> StorageBackend for ResilientBackend<B> {
    async fn read_chunk(&self, key: &str, offset: u64, length: u64) -> Result<Bytes> {
        if !self.read_chunk.allow_request() {
            return Self::short_circuit();
        }
        Self::observe(&self.read_chunk, self.inner.read_chunk(key, offset, length).await)
    }

    async fn size(&self, key: &str) -> Result<u64> {
        if !self.size.allow_request() {
            return Self::short_circuit();
        }
        Self::observe(&self.size, self.inner.size(key).await)
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        if !self.list_keys.allow_request() {
            return Self::short_circuit();
        }
        Self::observe(&self.list_keys, self.inner.list_keys().await)
    }
}
