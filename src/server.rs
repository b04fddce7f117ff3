//! HTTP server initialization and runtime setup.
//!
//! Handles store and cache connections, allocator restore, the Axum server
//! lifecycle and persisting the unused slug range on shutdown.

use crate::application::services::LinkService;
use crate::config::{Config, StoreBackend};
use crate::domain::allocator::SlugAllocator;
use crate::domain::range_authority::FixedRangeAuthority;
use crate::domain::repositories::DurableStore;
use crate::infrastructure::cache::{BestEffortCache, NullCache, RedisCache};
use crate::infrastructure::persistence::{MemoryRecordStore, PgRecordStore};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Connects a PostgreSQL pool with the configured limits.
pub async fn connect_pool(database_url: &str, config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .context("Failed to connect to database")
}

/// Builds the durable store selected by `STORE_BACKEND`, running migrations for PostgreSQL.
async fn build_store(config: &Config) -> Result<Arc<dyn DurableStore>> {
    match (config.store_backend, &config.database_url) {
        (StoreBackend::Postgres, Some(database_url)) => {
            let pool = connect_pool(database_url, config).await?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;

            Ok(Arc::new(PgRecordStore::new(Arc::new(pool))))
        }
        (StoreBackend::Postgres, None) => {
            anyhow::bail!("DATABASE_URL is required with STORE_BACKEND=postgres")
        }
        (StoreBackend::Memory, _) => {
            tracing::warn!("Using in-memory store; records are lost on restart");
            Ok(Arc::new(MemoryRecordStore::new()))
        }
    }
}

/// Connects Redis when configured; any failure degrades to [`NullCache`].
async fn build_cache(config: &Config) -> Arc<dyn BestEffortCache> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, config.store_timeout()).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

/// Creates the allocator, restoring a persisted range if one exists.
///
/// # Errors
///
/// A malformed or undeletable range file aborts startup.
async fn build_allocator(config: &Config) -> Result<Arc<SlugAllocator>> {
    let allocator = SlugAllocator::new(Arc::new(FixedRangeAuthority::default()));
    let path = config.counter_file.as_path();

    let exists = tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("Failed to inspect {}", path.display()))?;

    if exists {
        allocator
            .load(path)
            .await
            .with_context(|| format!("Refusing to start with range file {}", path.display()))?;
    } else {
        tracing::info!(
            path = %path.display(),
            "No persisted counter range, a fresh range is fetched on first create"
        );
    }

    Ok(Arc::new(allocator))
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received, draining connections");
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Durable store (PostgreSQL with migrations, or in-memory)
/// - Redis cache (or NullCache fallback)
/// - Slug allocator, restored from the counter file if present
/// - Axum HTTP server with graceful shutdown
///
/// After the server has drained, the unused range is written back to the
/// counter file.
///
/// # Errors
///
/// Returns an error if:
/// - Store connection or migration fails
/// - The counter file is malformed
/// - Server bind fails
/// - Server runtime error occurs
/// - The range cannot be persisted on shutdown
pub async fn run(config: Config) -> Result<()> {
    let store = build_store(&config).await?;
    let cache = build_cache(&config).await;
    let allocator = build_allocator(&config).await?;

    let link_service = Arc::new(LinkService::new(
        allocator.clone(),
        store,
        cache,
        config.cache_ttl(),
        config.store_timeout(),
    ));
    let state = AppState::new(link_service, config.max_slug_len);

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let saved = allocator
        .save(&config.counter_file)
        .await
        .context("Failed to persist counter range")?;
    tracing::info!(
        current = saved.current,
        end = saved.end,
        path = %config.counter_file.display(),
        "Counter range persisted"
    );

    Ok(())
}
