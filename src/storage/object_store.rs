//! S3-compatible object store backend.
//!
//! Keys map to objects under a fixed namespace prefix (default `videos/`).
//! Reads use ranged GETs, size lookups use HEAD, enumeration uses paginated
//! ListObjectsV2 filtered to the prefix. Callers only ever see bare keys;
//! the prefix never leaks out of this module.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use bytes::Bytes;

use crate::config::StorageConfig;

use super::{validate_key, Result, StorageBackend, StorageError};

/// Storage backend over an S3-compatible bucket.
pub struct ObjectStoreBackend {
    client: Client,
    bucket: String,
    prefix: String,
}

impl ObjectStoreBackend {
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Build a backend from configuration, loading AWS credentials and
    /// region from the environment the way the SDK normally does.
    pub async fn from_config(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &cfg.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &cfg.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        let bucket = cfg
            .bucket
            .clone()
            .ok_or_else(|| anyhow::anyhow!("storage.bucket is required in s3 mode"))?;

        Ok(Self::new(client, bucket, cfg.prefix.clone()))
    }

    fn object_key(&self, key: &str) -> Result<String> {
        validate_key(key)?;
        Ok(format!("{}{}", self.prefix, key))
    }
}

#[async_trait]
impl StorageBackend for ObjectStoreBackend {
    async fn read_chunk(&self, key: &str, offset: u64, length: u64) -> Result<Bytes> {
        let object_key = self.object_key(key)?;
        if length == 0 {
            return Ok(Bytes::new());
        }
        let range = format!("bytes={}-{}", offset, offset + length - 1);

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .range(range)
            .send()
            .await
            .map_err(|e| {
                let svc = e.into_service_error();
                if svc.is_no_such_key() {
                    StorageError::not_found(key)
                } else {
                    StorageError::unavailable("ranged GET failed", Some(Box::new(svc)))
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::unavailable("body read failed", Some(Box::new(e))))?;
        Ok(data.into_bytes())
    }

    async fn size(&self, key: &str) -> Result<u64> {
        let object_key = self.object_key(key)?;

        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
            .map_err(|e| {
                let svc = e.into_service_error();
                if svc.is_not_found() {
                    StorageError::not_found(key)
                } else {
                    StorageError::unavailable("HEAD failed", Some(Box::new(svc)))
                }
            })?;

        let len = output.content_length().unwrap_or(0);
        u64::try_from(len).map_err(|_| {
            StorageError::unavailable(format!("negative content length for {key}"), None)
        })
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&self.prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                StorageError::unavailable("listing failed", Some(Box::new(e)))
            })?;
            for object in page.contents() {
                let Some(full_key) = object.key() else { continue };
                // Addressing is owned here: strip the namespace prefix so
                // callers see the same bare keys on every backend.
                if let Some(bare) = full_key.strip_prefix(&self.prefix) {
                    if !bare.is_empty() {
                        keys.push(bare.to_string());
                    }
                }
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> ObjectStoreBackend {
        let conf = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .build();
        ObjectStoreBackend::new(Client::from_conf(conf), "test-bucket", "videos/")
    }

    #[test]
    fn object_key_applies_prefix() {
        assert_eq!(backend().object_key("movie.mp4").unwrap(), "videos/movie.mp4");
    }

    #[test]
    fn object_key_rejects_traversal() {
        assert!(matches!(
            backend().object_key("../secrets"),
            Err(StorageError::InvalidKey { .. })
        ));
    }
}
