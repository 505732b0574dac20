//! Caching layers in front of storage.
//!
//! [`MetadataCache`] bounds per-request latency on size lookups;
//! [`CatalogCache`] bounds listing request volume by refreshing a key
//! snapshot on a background interval.

mod catalog;
mod metadata;

pub use catalog::{spawn_refresh_task, CatalogCache, CatalogSnapshot};
pub use metadata::MetadataCache;
