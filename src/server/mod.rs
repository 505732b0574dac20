//! HTTP server: shared context, router assembly, startup and shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::cache::{spawn_refresh_task, CatalogCache, MetadataCache};
use crate::config::{Config, StorageMode};
use crate::storage::{
    FilesystemBackend, ObjectStoreBackend, ResilientBackend, StorageBackend, StorageError,
};
use crate::token::TokenSigner;

pub mod routes_media;
pub mod routes_range;
pub mod routes_token;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub storage: Arc<dyn StorageBackend>,
    pub metadata: Arc<MetadataCache>,
    pub catalog: Arc<CatalogCache>,
    pub tokens: Arc<TokenSigner>,
}

impl AppContext {
    /// Wire caches, token signer, and routes around an already-built
    /// storage backend.
    pub fn new(config: Config, storage: Arc<dyn StorageBackend>) -> Result<Self> {
        let metadata = Arc::new(MetadataCache::new(
            storage.clone(),
            Duration::from_secs(config.cache.metadata_ttl_secs),
        ));
        let catalog = Arc::new(CatalogCache::new(storage.clone()));

        let ttl = Duration::from_secs(config.token.ttl_secs);
        let tokens = match &config.token.secret {
            Some(secret) => {
                let secret = hex::decode(secret).context("token.secret must be hex")?;
                TokenSigner::new(secret, ttl)
            }
            None => {
                tracing::warn!(
                    "no token.secret configured, tokens will not survive a restart"
                );
                TokenSigner::ephemeral(ttl)
            }
        };

        Ok(Self {
            config: Arc::new(config),
            storage,
            metadata,
            catalog,
            tokens: Arc::new(tokens),
        })
    }
}

/// Build the storage backend selected by the configuration. The S3 backend
/// has an external network dependency and is wrapped with the circuit
/// breaker; the filesystem backend is used bare.
pub async fn build_backend(config: &Config) -> Result<Arc<dyn StorageBackend>> {
    match config.storage.mode {
        StorageMode::Filesystem => {
            tracing::info!(root = ?config.storage.root, "using filesystem storage");
            Ok(Arc::new(FilesystemBackend::new(&config.storage.root)))
        }
        StorageMode::S3 => {
            tracing::info!(
                bucket = ?config.storage.bucket,
                prefix = %config.storage.prefix,
                "using object store storage"
            );
            let backend = ObjectStoreBackend::from_config(&config.storage).await?;
            Ok(Arc::new(ResilientBackend::new(
                backend,
                (&config.circuit).into(),
            )))
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::RANGE]);

    // axum's `get` matches HEAD too; the handlers dispatch on the method
    // because HEAD must report the full object size, not a resolved range.
    Router::new()
        .route("/health", get(health_check))
        .route("/media", get(routes_media::list_media))
        .route("/range/media/:key", get(routes_range::serve_media))
        .route("/token/media/batch-tokens", post(routes_token::batch_tokens))
        .route("/token/media/signed/:token", get(routes_token::serve_signed))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Map a storage failure to the HTTP status the client sees.
///
/// `Unavailable` is deliberately distinct from `NotFound`: an open circuit
/// must never read as "this video does not exist".
pub(crate) fn storage_status(e: StorageError) -> StatusCode {
    match &e {
        StorageError::NotFound { .. } => StatusCode::NOT_FOUND,
        StorageError::InvalidKey { .. } => StatusCode::BAD_REQUEST,
        StorageError::Unavailable { .. } => {
            tracing::warn!(error = %e, "storage unavailable");
            StatusCode::SERVICE_UNAVAILABLE
        }
        StorageError::Io(_) => {
            tracing::error!(error = %e, "storage I/O failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let storage = build_backend(&config).await?;
    let refresh_secs = config.cache.catalog_refresh_secs;
    let ctx = AppContext::new(config, storage)?;

    // Catalog refresh runs on its own task, independent of request handling.
    let refresh_handle = spawn_refresh_task(ctx.catalog.clone(), refresh_secs);

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresh_handle.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
