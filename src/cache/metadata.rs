//! Object size cache with a fixed time-to-live.
//!
//! Cache-aside: each lookup checks the map, and on a miss or an expired
//! entry recomputes from the backend and replaces the entry. Failures are
//! never cached, so the next call retries the backend. Concurrent misses
//! for the same key may each hit the backend; there is no single-flight
//! guarantee.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::storage::{Result, StorageBackend};

struct SizeEntry {
    size: u64,
    expires_at: Instant,
}

/// TTL cache over [`StorageBackend::size`].
pub struct MetadataCache {
    backend: Arc<dyn StorageBackend>,
    entries: DashMap<String, SizeEntry>,
    ttl: Duration,
}

impl MetadataCache {
    pub fn new(backend: Arc<dyn StorageBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Size of the object, from cache when fresh.
    pub async fn get_size(&self, key: &str) -> Result<u64> {
        if let Some(entry) = self.entries.get(key) {
            if Instant::now() < entry.expires_at {
                return Ok(entry.size);
            }
        }

        let size = self.backend.size(key).await?;
        self.entries.insert(
            key.to_string(),
            SizeEntry {
                size,
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(size)
    }

    /// Drop a single entry, forcing the next lookup to the backend.
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
