//! # Marketplace Matcher — Binary Entrypoint
//! Boots the Axum HTTP server: interactive semantic matcher plus backlog
//! deduplicator (spec §6).
//!
//! ## Endpoints
//! - `GET /health` — liveness check
//! - `POST /match/interactive/start` / `/continue` / `/finalize`
//! - `POST /backlog/ingest`
//! - `GET /metrics` — Prometheus exposition

use std::sync::Arc;
use std::time::Duration;

use deadpool_postgres::{Config as PoolConfig, Runtime};
use tracing_subscriber::{fmt, EnvFilter};

use marketplace_matcher::api::{self, AppState};
use marketplace_matcher::backlog_writer::postgres::PostgresBacklogStore;
use marketplace_matcher::catalog::PostgresCatalogRepository;
use marketplace_matcher::config::Config;
use marketplace_matcher::llm::HttpLlmGateway;
use marketplace_matcher::metrics::Metrics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config = Config::from_env()?;

    let mut pool_config = PoolConfig::new();
    pool_config.url = Some(config.database_url.clone());
    let pool = pool_config.create_pool(Some(Runtime::Tokio1), tokio_postgres::NoTls)?;

    let gateway = HttpLlmGateway::new(
        config.llm_api_key.clone(),
        config.chat_model.clone(),
        config.embedding_model.clone(),
    )
    .with_base_url(config.llm_base_url.clone());

    let catalog = PostgresCatalogRepository::new(pool.clone());
    let backlog_store = PostgresBacklogStore::new(pool);

    let metrics = Metrics::init(&config.thresholds);

    let state = AppState {
        gateway: Arc::new(gateway),
        catalog: Arc::new(catalog),
        backlog_store: Arc::new(backlog_store),
        thresholds: config.thresholds,
        deadline: Duration::from_secs(20),
    };

    let app = api::router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "marketplace-matcher listening");
    axum::serve(listener, app).await?;

    Ok(())
}
