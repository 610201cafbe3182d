//! 캔들 동기화 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # ETHUSDT 1시간봉 동기화
//! klinesync sync --start 2024-01-01 --end 2024-02-01
//!
//! # 다른 심볼/간격
//! klinesync sync --start "2024-01-01 00:00" --end "2024-01-02 00:00" \
//!     --interval 15m --symbol BTCUSDT
//! ```

use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use klinesync_api::time::parse_datetime;
use klinesync_core::logging::{init_logging, LogConfig};
use klinesync_core::{ServiceConfig, SyncConfig, Timeframe};
use klinesync_data::{CandleStore, MemoryCandleStore, PgCandleStore};
use klinesync_engine::{SyncExecutor, SyncRequest};
use klinesync_exchange::{BinanceConfig, BinanceFetcher};

#[derive(Parser)]
#[command(name = "klinesync")]
#[command(about = "Historical candle synchronizer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 과거 캔들 구간을 업스트림에서 받아 DB에 병합
    Sync {
        /// 범위 시작 (YYYY-MM-DD [HH:MM[:SS]] 또는 RFC 3339)
        #[arg(long)]
        start: String,

        /// 범위 종료, 배타 (YYYY-MM-DD [HH:MM[:SS]] 또는 RFC 3339)
        #[arg(long)]
        end: String,

        /// 캔들 간격 (1m, 5m, 15m, 30m, 1h, 4h, 1d)
        #[arg(long, default_value = "1h")]
        interval: String,

        /// 심볼 (기본: SYNC_SYMBOL 환경변수 또는 ETHUSDT)
        #[arg(long)]
        symbol: Option<String>,

        /// DB 없이 인메모리 저장소로 실행 (페치/계획 검증용)
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_logging(LogConfig::from_env()).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            start,
            end,
            interval,
            symbol,
            dry_run,
        } => run_sync(start, end, interval, symbol, dry_run).await,
    }
}

async fn run_sync(
    start: String,
    end: String,
    interval: String,
    symbol: Option<String>,
    dry_run: bool,
) -> anyhow::Result<ExitCode> {
    let timeframe = Timeframe::from_str(&interval).context("invalid interval")?;
    let start = parse_datetime(&start).context("invalid start")?;
    let end = parse_datetime(&end).context("invalid end")?;

    let sync_config = SyncConfig::from_env();
    sync_config
        .validate()
        .context("invalid sync configuration")?;
    let symbol = symbol.unwrap_or_else(|| sync_config.symbol.clone());

    let store: Arc<dyn CandleStore> = if dry_run {
        info!("dry-run: 인메모리 저장소 사용, DB에 기록하지 않습니다");
        Arc::new(MemoryCandleStore::new())
    } else {
        let service_config =
            ServiceConfig::from_env().context("failed to load service config")?;
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&service_config.database_url)
            .await
            .context("failed to connect to database")?;
        let store = PgCandleStore::new(pool);
        store
            .ensure_schema()
            .await
            .context("failed to prepare schema")?;
        Arc::new(store)
    };

    let fetcher_config = BinanceConfig {
        timeout_secs: sync_config.request_timeout_secs,
        page_limit: sync_config.page_limit,
        ..BinanceConfig::from_env()
    };
    let fetcher =
        BinanceFetcher::new(fetcher_config).context("failed to build upstream client")?;

    // Ctrl+C로 진행 중인 동기화 취소
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("취소 신호 수신, 새 요청을 중단합니다");
            signal_token.cancel();
        }
    });

    let executor =
        SyncExecutor::new(Arc::new(fetcher), store, sync_config).with_cancellation(cancel);
    let request = SyncRequest::new(symbol, timeframe, start, end);
    let report = executor.execute(&request).await?;

    if report.success {
        info!(
            written = report.records_written,
            skipped = report.records_skipped_duplicate,
            "동기화 성공"
        );
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(
            gaps = report.gaps_detected.len(),
            error = report.error.as_deref().unwrap_or("unknown"),
            "동기화 실패"
        );
        Ok(ExitCode::FAILURE)
    }
}
