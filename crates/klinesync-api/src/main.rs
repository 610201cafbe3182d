//! 캔들 동기화 API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use klinesync_api::{create_router, AppState};
use klinesync_core::logging::{init_logging, LogConfig};
use klinesync_core::{ServiceConfig, SyncConfig};
use klinesync_data::PgCandleStore;
use klinesync_exchange::{BinanceConfig, BinanceFetcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LogConfig::from_env()).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let service_config = ServiceConfig::from_env().context("failed to load service config")?;
    let sync_config = SyncConfig::from_env();
    sync_config
        .validate()
        .context("invalid sync configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&service_config.database_url)
        .await
        .context("failed to connect to database")?;

    let store = PgCandleStore::new(pool);
    store
        .ensure_schema()
        .await
        .context("failed to prepare schema")?;

    let fetcher_config = BinanceConfig {
        timeout_secs: sync_config.request_timeout_secs,
        page_limit: sync_config.page_limit,
        ..BinanceConfig::from_env()
    };
    let fetcher =
        BinanceFetcher::new(fetcher_config).context("failed to build upstream client")?;

    let state = AppState::new(Arc::new(fetcher), Arc::new(store), sync_config);
    let app = create_router(state);

    let addr = format!("{}:{}", service_config.host, service_config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(%addr, "API 서버 시작");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

/// Ctrl+C 수신 시 graceful shutdown.
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("종료 신호 수신, 서버를 중지합니다");
    }
}
