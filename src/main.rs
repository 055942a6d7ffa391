//! Identity Cache - read-through lookup cache for an authentication service

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use identity_cache::api::create_router;
use identity_cache::cache::{Cache, MemoryCache, RedisCache};
use identity_cache::storage::{MemoryStorage, PersistentStore, PostgresStorage};
use identity_cache::{spawn_cleanup_task, AppState, Config, ReadinessGate};

/// Main entry point for the identity cache service.
///
/// # Startup Sequence
/// 1. Load configuration from environment variables
/// 2. Initialize tracing subscriber for logging
/// 3. Build the cache client and persistent store pool (no network I/O yet)
/// 4. Run the readiness gate: store first, then cache
/// 5. Wire cached providers and start the HTTP server
/// 6. On SIGINT/SIGTERM drain requests, then close the cache, then the store
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config.env);

    info!(
        env = %config.env,
        port = config.server_port,
        postgres = config.postgres_dsn.is_some(),
        redis = config.redis_url.is_some(),
        cache_ttl_secs = config.cache_ttl,
        "Starting identity cache"
    );

    let (cache, cleanup_handle): (Arc<dyn Cache>, Option<JoinHandle<()>>) = match &config.redis_url {
        Some(url) => {
            let redis = RedisCache::connect(
                url,
                config.redis_pool_size,
                config.gate_config().attempt_timeout,
            )
            .context("invalid REDIS_URL")?;
            let cache: Arc<dyn Cache> = Arc::new(redis);
            (cache, None)
        }
        None => {
            warn!("REDIS_URL not set, using in-memory cache");
            let memory = Arc::new(MemoryCache::new());
            let handle = spawn_cleanup_task(memory.clone(), config.cleanup_interval);
            let cache: Arc<dyn Cache> = memory;
            (cache, Some(handle))
        }
    };

    match &config.postgres_dsn {
        Some(dsn) => {
            let store = PostgresStorage::connect(
                dsn,
                config.postgres_max_connections,
                config.gate_config().attempt_timeout,
            )
            .context("invalid POSTGRES_DSN")?;
            serve(Arc::new(store), cache, cleanup_handle, &config).await
        }
        None => {
            warn!("POSTGRES_DSN not set, using in-memory store");
            serve(Arc::new(MemoryStorage::new()), cache, cleanup_handle, &config).await
        }
    }
}

async fn serve<S>(
    store: Arc<S>,
    cache: Arc<dyn Cache>,
    cleanup_handle: Option<JoinHandle<()>>,
    config: &Config,
) -> anyhow::Result<()>
where
    S: PersistentStore + 'static,
{
    let gate = ReadinessGate::new(config.gate_config());
    gate.wait_for(store.backend_name(), || store.ping())
        .await
        .context("persistent store not ready, refusing to start")?;
    gate.wait_for(cache.backend_name(), || cache.ping())
        .await
        .context("cache store not ready, refusing to start")?;

    let state = AppState::new(store.clone(), cache.clone(), config);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    // Returns once in-flight requests have drained.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(handle) = cleanup_handle {
        handle.abort();
    }
    cache.close().await;
    info!(backend = cache.backend_name(), "Cache client closed");
    store.close().await;
    info!(backend = store.backend_name(), "Store pool closed");

    info!("Server shutdown complete");
    Ok(())
}

/// Defaults to debug for local/dev profiles; RUST_LOG overrides.
fn init_tracing(env: &str) {
    let default_filter = match env {
        "local" | "dev" => "identity_cache=debug,tower_http=debug",
        _ => "identity_cache=info,tower_http=info",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, draining requests...");
        }
        _ = terminate => {
            info!("Received SIGTERM, draining requests...");
        }
    }
}
