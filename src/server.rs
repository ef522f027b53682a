//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, worker spawning, and Axum server lifecycle.

use crate::config::Config;
use crate::domain::click_worker::{ClickQueue, ClickRecorder, run_click_worker};
use crate::domain::repositories::UsageCounter;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache, connect_manager};
use crate::infrastructure::counter::RedisUsageCounter;
use crate::infrastructure::persistence::{
    PgAnalyticsRepository, PgLinkRepository, PgTokenRepository, PgUsageCounter,
};
use crate::routes::app_router;
use crate::state::{AppState, Repositories, StateSettings};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// How long the click worker may take to drain after the server stops.
const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// How often expired quota counters are removed from PostgreSQL.
const COUNTER_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache and quota counter (or NullCache and the PostgreSQL counter)
/// - Background click worker
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.connect_timeout)
        .idle_timeout(config.database.idle_timeout)
        .max_lifetime(config.database.max_lifetime)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let pool = Arc::new(pool);
    let (cache, usage) = select_backends(&config, pool.clone()).await;

    let links = Arc::new(PgLinkRepository::new(pool.clone()));
    let analytics = Arc::new(PgAnalyticsRepository::new(pool.clone()));
    let tokens = Arc::new(PgTokenRepository::new(pool.clone()));

    let recorder = Arc::new(ClickRecorder::new(analytics.clone(), links.clone()));
    let (click_queue, click_rx) = ClickQueue::new(config.clicks.queue_capacity, recorder.clone());
    let overflow = click_queue.overflow();
    let worker = tokio::spawn(run_click_worker(
        click_rx,
        recorder,
        config.clicks.worker_concurrency,
    ));

    let state = AppState::new(
        Repositories {
            links,
            analytics,
            tokens,
            usage,
        },
        cache,
        click_queue,
        StateSettings {
            base_url: config.server.base_url.clone(),
            token_signing_secret: config.token_signing_secret.clone(),
            rate_limit_per_day: config.links.rate_limit_per_day,
            code: config.links.code,
            behind_proxy: config.server.behind_proxy,
        },
    );

    let app = app_router(state);

    let addr: SocketAddr = config.server.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router (and every queue sender inside it) is gone, so the worker
    // sees the channel close once the backlog is drained.
    let drained = tokio::time::timeout(WORKER_DRAIN_TIMEOUT, async {
        let worker = worker.await;
        overflow.drain().await;
        worker
    })
    .await;

    match drained {
        Ok(Ok(())) => tracing::info!("Click queue drained"),
        Ok(Err(e)) => tracing::error!("Click worker panicked: {}", e),
        Err(_) => tracing::warn!(
            "Click worker did not drain within {}s, pending clicks are lost",
            WORKER_DRAIN_TIMEOUT.as_secs()
        ),
    }

    Ok(())
}

/// Picks the cache and quota counter backends.
///
/// Both share one Redis connection when Redis is configured and reachable.
/// Otherwise caching is disabled and quotas are counted in PostgreSQL.
async fn select_backends(
    config: &Config,
    pool: Arc<PgPool>,
) -> (Arc<dyn CacheService>, Arc<dyn UsageCounter>) {
    if let Some(redis_url) = &config.redis_url {
        match connect_manager(redis_url).await {
            Ok(manager) => {
                tracing::info!("Cache enabled (Redis)");
                return (
                    Arc::new(RedisCache::from_manager(
                        manager.clone(),
                        config.cache_ttl_seconds,
                    )),
                    Arc::new(RedisUsageCounter::new(manager)),
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to connect to Redis: {}. Using NullCache and PostgreSQL counters.",
                    e
                );
            }
        }
    } else {
        tracing::info!("Cache disabled (NullCache)");
    }

    let counter = Arc::new(PgUsageCounter::new(pool));
    spawn_counter_purge(counter.clone());

    (Arc::new(NullCache::new()), counter)
}

fn spawn_counter_purge(counter: Arc<PgUsageCounter>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(COUNTER_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match counter.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Purged expired usage counters"),
                Err(e) => tracing::warn!("Failed to purge usage counters: {}", e),
            }
        }
    });
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
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
