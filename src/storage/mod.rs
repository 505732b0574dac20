//! Storage backend abstraction for media objects.
//!
//! A [`StorageBackend`] gives random access to opaque keyed objects:
//! ranged reads, size lookup, and key enumeration. Implementations:
//!
//! - [`FilesystemBackend`] — files under a fixed root directory
//! - [`ObjectStoreBackend`] — an S3-compatible bucket
//! - [`ResilientBackend`] — circuit-breaker decorator over another backend

mod circuit;
mod filesystem;
mod object_store;
mod resilient;

pub use circuit::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use filesystem::FilesystemBackend;
pub use object_store::ObjectStoreBackend;
pub use resilient::ResilientBackend;

use async_trait::async_trait;
use bytes::Bytes;

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors surfaced by storage backends.
///
/// `NotFound` and `Unavailable` are distinct on purpose: an open circuit or
/// a transport failure says nothing about whether the key exists, and
/// callers map them to different HTTP statuses (404 vs 503).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The key does not address any stored object.
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// The key is not addressable (path traversal, absolute path, NUL).
    #[error("invalid storage key: {key}")]
    InvalidKey { key: String },

    /// A disk or transport error while reading an existing key.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend is unreachable or the circuit is open.
    #[error("storage unavailable: {reason}")]
    Unavailable {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StorageError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey { key: key.into() }
    }

    pub fn unavailable(
        reason: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Unavailable {
            reason: reason.into(),
            source,
        }
    }
}

/// Capability set every storage backend provides.
///
/// Implementations must be safe under concurrent calls for different keys;
/// per-call resources (file handles, connections) are scoped to the call
/// and released on every exit path.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read up to `length` bytes starting at `offset`.
    ///
    /// A read past end-of-object returns the available bytes without error;
    /// only a missing key or an I/O failure is an error.
    async fn read_chunk(&self, key: &str, offset: u64, length: u64) -> Result<Bytes>;

    /// Total size of the object in bytes.
    async fn size(&self, key: &str) -> Result<u64>;

    /// Enumerate all currently addressable keys, in stable order.
    async fn list_keys(&self) -> Result<Vec<String>>;
}

/// Reject keys that could escape the backend's addressing root.
///
/// Centralized here so every backend applies the same rule before any I/O:
/// no parent-directory segments, no absolute paths, no backslashes, no NUL.
pub fn validate_key(key: &str) -> Result<()> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.contains('\0')
        || key.split('/').any(|seg| seg == "..");
    if bad {
        return Err(StorageError::invalid_key(key));
    }
    Ok(())
}

/// Infer a content type from the key's file extension.
pub fn content_type_for_key(key: &str) -> &'static str {
    let ext = key.rsplit('.').next().unwrap_or("");
    match ext.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "ts" | "m2ts" => "video/mp2t",
        "m4a" => "audio/mp4",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}
