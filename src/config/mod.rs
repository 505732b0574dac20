mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./streamgate.toml",
        "~/.config/streamgate/config.toml",
        "/etc/streamgate/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    match config.storage.mode {
        StorageMode::Filesystem => {
            if !config.storage.root.exists() {
                tracing::warn!("Storage root does not exist: {:?}", config.storage.root);
            }
        }
        StorageMode::S3 => {
            if config.storage.bucket.is_none() {
                anyhow::bail!("storage.bucket is required when storage.mode = \"s3\"");
            }
        }
    }

    if config.streaming.chunk_size_bytes == 0 {
        anyhow::bail!("streaming.chunk_size_bytes cannot be 0");
    }

    if config.circuit.failure_threshold == 0 {
        anyhow::bail!("circuit.failure_threshold cannot be 0");
    }

    if let Some(secret) = &config.token.secret {
        hex::decode(secret).context("token.secret must be a hex string")?;
    }

    Ok(())
}
