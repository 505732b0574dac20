//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which wires an [`AppContext`] over a filesystem
//! backend rooted in a temp directory. The [`with_server`] constructor
//! starts Axum on a random port for HTTP-level testing.

use std::net::SocketAddr;
use std::sync::Arc;

use streamgate::config::Config;
use streamgate::server::{create_router, AppContext};
use streamgate::storage::FilesystemBackend;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by a
/// temp-directory filesystem backend.
pub struct TestHarness {
    pub ctx: AppContext,
    pub dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new harness with a custom configuration. The storage root
    /// is always overridden to point at the harness temp directory.
    pub fn with_config(mut config: Config) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        config.storage.root = dir.path().to_path_buf();

        let storage = Arc::new(FilesystemBackend::new(dir.path()));
        let ctx = AppContext::new(config, storage).expect("failed to build context");

        Self { ctx, dir }
    }

    /// Write a media file into the backend root.
    pub fn write_media(&self, name: &str, data: &[u8]) {
        std::fs::write(self.dir.path().join(name), data).expect("failed to write fixture");
    }

    /// Start an Axum server on a random port and return the harness
    /// together with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Like [`with_server`](Self::with_server) with a custom configuration.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind");
        let addr = listener.local_addr().expect("no local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server error");
        });

        (harness, addr)
    }
}
