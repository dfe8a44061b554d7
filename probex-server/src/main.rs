mod config;
mod errors;
mod handlers;
mod routes;
mod state;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use probex_core::{
    AnalysisWorker, FfprobeRunner, FileSourceFetcher, HttpSourceFetcher, JobService, JobStore,
    MemoryJobStore, PgJobStore, ProbeRunner, SourceFetcher, WorkerConfig,
};

use crate::config::{Config, FetcherKind, StoreBackend};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env().context("failed to load configuration")?);
    info!(
        listen = %config.listen_addr(),
        poll_interval_secs = config.poll_interval.as_secs(),
        probe_binary = %config.probe_binary,
        "configuration loaded"
    );

    let store = build_store(&config).await?;
    let service = JobService::new(store);

    let shutdown = CancellationToken::new();
    let worker_handle = spawn_worker(service.clone(), &config, shutdown.clone());

    let state = AppState::new(service, Arc::clone(&config));
    let router = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;
    info!("listening on {}", config.listen_addr());

    let server_shutdown = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown requested");
            server_shutdown.cancel();
        })
        .await
        .context("server error")?;

    // The worker observes the token between iterations; an in-flight
    // probe finishes before the loop exits.
    if let Err(err) = worker_handle.await {
        warn!(error = %err, "worker task ended abnormally");
    }
    info!("probex stopped");
    Ok(())
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn JobStore>> {
    match &config.store {
        StoreBackend::Memory => {
            info!("using in-memory job store");
            Ok(Arc::new(MemoryJobStore::new()))
        }
        StoreBackend::Postgres { database_url } => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .context("failed to connect to Postgres")?;
            let store = PgJobStore::new(pool)
                .await
                .context("failed to initialize Postgres job store")?;
            Ok(Arc::new(store))
        }
    }
}

fn spawn_worker(
    service: JobService,
    config: &Config,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let fetcher: Arc<dyn SourceFetcher> = match &config.fetcher {
        FetcherKind::Http => Arc::new(HttpSourceFetcher::new()),
        FetcherKind::File { root } => Arc::new(FileSourceFetcher::new(root.clone())),
    };
    let prober: Arc<dyn ProbeRunner> = Arc::new(FfprobeRunner::new(&config.probe_binary));
    let worker = AnalysisWorker::new(
        service,
        fetcher,
        prober,
        WorkerConfig {
            poll_interval: config.poll_interval,
        },
        shutdown,
    );
    tokio::spawn(async move { worker.run().await })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
