//! Local filesystem storage backend.
//!
//! Keys resolve relative to a fixed root directory. Enumeration covers the
//! top level only and includes only regular files.

use std::io::SeekFrom;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::{validate_key, Result, StorageBackend, StorageError};

/// Storage backend over a local directory.
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn read_chunk(&self, key: &str, offset: u64, length: u64) -> Result<Bytes> {
        let path = self.resolve(key)?;
        let mut file = File::open(&path).await.map_err(|e| map_open_err(e, key))?;
        file.seek(SeekFrom::Start(offset)).await?;

        let mut buf = Vec::with_capacity(length.min(64 * 1024) as usize);
        file.take(length).read_to_end(&mut buf).await?;
        Ok(Bytes::from(buf))
    }

    async fn size(&self, key: &str) -> Result<u64> {
        let path = self.resolve(key)?;
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| map_open_err(e, key))?;
        if !meta.is_file() {
            return Err(StorageError::not_found(key));
        }
        Ok(meta.len())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                keys.push(name);
            }
        }
        // Directory iteration order is platform-dependent.
        keys.sort();
        Ok(keys)
    }
}

fn map_open_err(e: std::io::Error, key: &str) -> StorageError {
    if e.kind() == std::io::ErrorKind::NotFound {
        StorageError::not_found(key)
    } else {
        StorageError::Io(e)
    }
}
