//! PostgreSQL 캔들 저장소.
//!
//! UNNEST 패턴의 일괄 upsert로 윈도우 단위 원자성을 보장합니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use tracing::{debug, info};

use klinesync_core::{Candle, Timeframe};

use crate::error::{StoreError, StoreResult};
use crate::store::CandleStore;

/// klines 테이블 생성 SQL.
///
/// (symbol, timeframe, open_time) 복합 기본 키로 캔들의 고유성을 보장합니다.
const KLINE_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS klines (
    symbol        TEXT        NOT NULL,
    timeframe     TEXT        NOT NULL,
    open_time     TIMESTAMPTZ NOT NULL,
    open          NUMERIC     NOT NULL,
    high          NUMERIC     NOT NULL,
    low           NUMERIC     NOT NULL,
    close         NUMERIC     NOT NULL,
    volume        NUMERIC     NOT NULL,
    close_time    TIMESTAMPTZ NOT NULL,
    quote_volume  NUMERIC,
    num_trades    INTEGER,
    fetched_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (symbol, timeframe, open_time)
);
"#;

/// PostgreSQL 캔들 저장소.
#[derive(Clone)]
pub struct PgCandleStore {
    pool: PgPool,
}

impl PgCandleStore {
    /// 새 저장소 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 테이블이 없으면 생성합니다.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(KLINE_TABLE_SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationError(e.to_string()))?;

        info!("klines 테이블 준비 완료");
        Ok(())
    }
}

#[async_trait]
impl CandleStore for PgCandleStore {
    async fn upsert_batch(&self, candles: &[Candle]) -> StoreResult<usize> {
        if candles.is_empty() {
            return Ok(0);
        }

        // 각 컬럼에 대한 배열 생성 (UNNEST 일괄 삽입)
        let symbols: Vec<&str> = candles.iter().map(|c| c.symbol.as_str()).collect();
        let timeframes: Vec<&str> = candles
            .iter()
            .map(|c| c.timeframe.to_binance_interval())
            .collect();
        let open_times: Vec<DateTime<Utc>> = candles.iter().map(|c| c.open_time).collect();
        let opens: Vec<Decimal> = candles.iter().map(|c| c.open).collect();
        let highs: Vec<Decimal> = candles.iter().map(|c| c.high).collect();
        let lows: Vec<Decimal> = candles.iter().map(|c| c.low).collect();
        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<Decimal> = candles.iter().map(|c| c.volume).collect();
        let close_times: Vec<DateTime<Utc>> = candles.iter().map(|c| c.close_time).collect();
        let quote_volumes: Vec<Option<Decimal>> =
            candles.iter().map(|c| c.quote_volume).collect();
        let num_trades: Vec<Option<i32>> = candles
            .iter()
            .map(|c| c.num_trades.map(|n| n as i32))
            .collect();

        // 단일 문장이므로 윈도우 단위 원자성이 보장된다.
        let result = sqlx::query(
            r#"
            INSERT INTO klines
                (symbol, timeframe, open_time, open, high, low, close, volume,
                 close_time, quote_volume, num_trades, fetched_at)
            SELECT *, NOW() FROM UNNEST(
                $1::text[], $2::text[], $3::timestamptz[],
                $4::numeric[], $5::numeric[], $6::numeric[], $7::numeric[], $8::numeric[],
                $9::timestamptz[], $10::numeric[], $11::int4[]
            )
            ON CONFLICT (symbol, timeframe, open_time) DO UPDATE SET
                open = EXCLUDED.open,
                high = EXCLUDED.high,
                low = EXCLUDED.low,
                close = EXCLUDED.close,
                volume = EXCLUDED.volume,
                close_time = EXCLUDED.close_time,
                quote_volume = EXCLUDED.quote_volume,
                num_trades = EXCLUDED.num_trades,
                fetched_at = NOW()
            "#,
        )
        .bind(&symbols)
        .bind(&timeframes)
        .bind(&open_times)
        .bind(&opens)
        .bind(&highs)
        .bind(&lows)
        .bind(&closes)
        .bind(&volumes)
        .bind(&close_times)
        .bind(&quote_volumes)
        .bind(&num_trades)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::InsertError(e.to_string()))?;

        let affected = result.rows_affected() as usize;
        debug!(count = affected, "캔들 일괄 upsert 완료");
        Ok(affected)
    }

    async fn exists(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        open_time: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result: Option<(i32,)> = sqlx::query_as(
            r#"
            SELECT 1 FROM klines
            WHERE symbol = $1 AND timeframe = $2 AND open_time = $3
            "#,
        )
        .bind(symbol)
        .bind(timeframe.to_binance_interval())
        .bind(open_time)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result.is_some())
    }

    async fn range_count(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM klines
            WHERE symbol = $1 AND timeframe = $2 AND open_time >= $3 AND open_time < $4
            "#,
        )
        .bind(symbol)
        .bind(timeframe.to_binance_interval())
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0 as u64)
    }

    async fn open_times_in_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<DateTime<Utc>>> {
        let rows: Vec<(DateTime<Utc>,)> = sqlx::query_as(
            r#"
            SELECT open_time FROM klines
            WHERE symbol = $1 AND timeframe = $2 AND open_time >= $3 AND open_time < $4
            ORDER BY open_time ASC
            "#,
        )
        .bind(symbol)
        .bind(timeframe.to_binance_interval())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(t,)| t).collect())
    }
}
