use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub streaming: StreamingConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub circuit: CircuitConfig,

    #[serde(default)]
    pub token: TokenConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which backend serves media and where it points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Filesystem,
    S3,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_mode")]
    pub mode: StorageMode,

    /// Root directory for filesystem mode.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,

    /// Bucket name for s3 mode.
    #[serde(default)]
    pub bucket: Option<String>,

    /// Namespace prefix objects live under in s3 mode.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible stores (MinIO etc.).
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_storage_mode() -> StorageMode {
    StorageMode::Filesystem
}
fn default_storage_root() -> PathBuf {
    PathBuf::from("./media")
}
fn default_prefix() -> String {
    "videos/".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: default_storage_mode(),
            root: default_storage_root(),
            bucket: None,
            prefix: default_prefix(),
            region: None,
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamingConfig {
    /// Maximum bytes served for an open-ended range request.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: u64,
}

fn default_chunk_size() -> u64 {
    crate::range::DEFAULT_CHUNK_SIZE
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: default_chunk_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// How long a cached object size stays valid.
    #[serde(default = "default_metadata_ttl")]
    pub metadata_ttl_secs: u64,

    /// Interval between catalog refreshes.
    #[serde(default = "default_catalog_refresh")]
    pub catalog_refresh_secs: u64,
}

fn default_metadata_ttl() -> u64 {
    600
}
fn default_catalog_refresh() -> u64 {
    30
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            metadata_ttl_secs: default_metadata_ttl(),
            catalog_refresh_secs: default_catalog_refresh(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CircuitConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,

    #[serde(default = "default_half_open_successes")]
    pub half_open_success_threshold: u32,
}

fn default_failure_threshold() -> u32 {
    5
}
fn default_cooldown() -> u64 {
    30
}
fn default_half_open_successes() -> u32 {
    2
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown(),
            half_open_success_threshold: default_half_open_successes(),
        }
    }
}

impl From<&CircuitConfig> for crate::storage::CircuitBreakerConfig {
    fn from(c: &CircuitConfig) -> Self {
        Self {
            failure_threshold: c.failure_threshold,
            cooldown: std::time::Duration::from_secs(c.cooldown_secs),
            half_open_success_threshold: c.half_open_success_threshold,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    /// Hex-encoded signing secret (generate with `streamgate generate-secret`).
    /// When unset a random per-process secret is used, so issued tokens do
    /// not survive a restart.
    #[serde(default)]
    pub secret: Option<String>,

    /// Token lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub ttl_secs: u64,
}

fn default_token_ttl() -> u64 {
    600
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: None,
            ttl_secs: default_token_ttl(),
        }
    }
}
