//! Periodically refreshed catalog of storage keys.
//!
//! A background task calls [`CatalogCache::refresh`] on a fixed interval
//! and swaps in a complete new snapshot on success. Refresh failures are
//! logged and swallowed: readers keep the last good snapshot, so the
//! catalog is best-effort and eventually consistent but never half-updated.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;

use crate::storage::StorageBackend;

/// Immutable view of all known keys at a point in time.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub keys: Vec<String>,
    pub captured_at: SystemTime,
}

impl CatalogSnapshot {
    fn empty() -> Self {
        Self {
            keys: Vec::new(),
            captured_at: SystemTime::UNIX_EPOCH,
        }
    }
}

/// Snapshot cache over [`StorageBackend::list_keys`].
pub struct CatalogCache {
    backend: Arc<dyn StorageBackend>,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogCache {
    /// Starts with an empty snapshot; call [`refresh`](Self::refresh) (or
    /// spawn the refresh task) to populate it.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            snapshot: RwLock::new(Arc::new(CatalogSnapshot::empty())),
        }
    }

    /// Re-list keys and atomically replace the snapshot on success.
    /// On failure the previous snapshot is retained unchanged.
    pub async fn refresh(&self) {
        match self.backend.list_keys().await {
            Ok(keys) => {
                let snapshot = Arc::new(CatalogSnapshot {
                    keys,
                    captured_at: SystemTime::now(),
                });
                *self.snapshot.write() = snapshot;
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog refresh failed, keeping previous snapshot");
            }
        }
    }

    /// Current snapshot. Always internally consistent; never blocks beyond
    /// acquiring the snapshot reference.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.read().clone()
    }
}

/// Run an initial refresh, then keep refreshing on a fixed interval on a
/// dedicated background task.
pub fn spawn_refresh_task(
    catalog: Arc<CatalogCache>,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            // First tick fires immediately, covering the startup refresh.
            interval.tick().await;
            catalog.refresh().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::storage::{Result, StorageError};

    use super::*;

    #[derive(Default)]
    struct ToggleBackend {
        failing: AtomicBool,
        keys: parking_lot::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StorageBackend for ToggleBackend {
        async fn read_chunk(&self, _key: &str, _offset: u64, _length: u64) -> Result<Bytes> {
            Ok(Bytes::new())
        }

        async fn size(&self, _key: &str) -> Result<u64> {
            Ok(0)
        }

        async fn list_keys(&self) -> Result<Vec<String>> {
            if self.failing.load(Ordering::SeqCst) {
                Err(StorageError::Io(std::io::Error::other("listing broken")))
            } else {
                Ok(self.keys.lock().clone())
            }
        }
    }

    #[tokio::test]
    async fn starts_empty_then_populates_on_refresh() {
        let backend = Arc::new(ToggleBackend::default());
        *backend.keys.lock() = vec!["a.mp4".into(), "b.mp4".into()];
        let catalog = CatalogCache::new(backend);

        assert!(catalog.snapshot().keys.is_empty());
        catalog.refresh().await;
        assert_eq!(catalog.snapshot().keys, vec!["a.mp4", "b.mp4"]);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let backend = Arc::new(ToggleBackend::default());
        *backend.keys.lock() = vec!["a.mp4".into()];
        let catalog = CatalogCache::new(backend.clone());

        catalog.refresh().await;
        let before = catalog.snapshot();

        backend.failing.store(true, Ordering::SeqCst);
        catalog.refresh().await;

        let after = catalog.snapshot();
        assert_eq!(after.keys, before.keys);
        assert_eq!(after.captured_at, before.captured_at);
    }

    #[tokio::test]
    async fn successful_refresh_replaces_snapshot_wholesale() {
        let backend = Arc::new(ToggleBackend::default());
        *backend.keys.lock() = vec!["a.mp4".into()];
        let catalog = CatalogCache::new(backend.clone());

        catalog.refresh().await;
        let first = catalog.snapshot();

        *backend.keys.lock() = vec!["b.mp4".into(), "c.mp4".into()];
        catalog.refresh().await;

        assert_eq!(catalog.snapshot().keys, vec!["b.mp4", "c.mp4"]);
        // Old snapshot handed out earlier stays intact for its holders.
        assert_eq!(first.keys, vec!["a.mp4"]);
    }

    #[tokio::test]
    async fn refresh_task_populates_in_background() {
        let backend = Arc::new(ToggleBackend::default());
        *backend.keys.lock() = vec!["a.mp4".into()];
        let catalog = Arc::new(CatalogCache::new(backend));

        let handle = spawn_refresh_task(catalog.clone(), 60);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(catalog.snapshot().keys, vec!["a.mp4"]);
        handle.abort();
    }
}
