//! 인메모리 캔들 저장소.
//!
//! 엔진 테스트와 오프라인 실행(dry-run)에 사용합니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use klinesync_core::{Candle, Timeframe};

use crate::error::{StoreError, StoreResult};
use crate::store::CandleStore;

type Key = (String, Timeframe, DateTime<Utc>);

/// BTreeMap 기반 인메모리 캔들 저장소.
#[derive(Debug, Default)]
pub struct MemoryCandleStore {
    candles: RwLock<BTreeMap<Key, Candle>>,
}

impl MemoryCandleStore {
    /// 새 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 전체 캔들 수.
    pub fn len(&self) -> usize {
        self.candles.read().map(|m| m.len()).unwrap_or(0)
    }

    /// 저장소가 비어 있는지 확인.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_guard(
        &self,
    ) -> StoreResult<std::sync::RwLockReadGuard<'_, BTreeMap<Key, Candle>>> {
        self.candles
            .read()
            .map_err(|e| StoreError::QueryError(format!("lock poisoned: {}", e)))
    }
}

#[async_trait]
impl CandleStore for MemoryCandleStore {
    async fn upsert_batch(&self, candles: &[Candle]) -> StoreResult<usize> {
        let mut map = self
            .candles
            .write()
            .map_err(|e| StoreError::InsertError(format!("lock poisoned: {}", e)))?;

        for candle in candles {
            let key = (candle.symbol.clone(), candle.timeframe, candle.open_time);
            map.insert(key, candle.clone());
        }
        Ok(candles.len())
    }

    async fn exists(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        open_time: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let map = self.read_guard()?;
        Ok(map.contains_key(&(symbol.to_string(), timeframe, open_time)))
    }

    async fn range_count(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<u64> {
        Ok(self
            .open_times_in_range(symbol, timeframe, start, end)
            .await?
            .len() as u64)
    }

    async fn open_times_in_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<DateTime<Utc>>> {
        let map = self.read_guard()?;
        let lower = (symbol.to_string(), timeframe, start);
        let upper = (symbol.to_string(), timeframe, end);

        Ok(map
            .range((Bound::Included(lower), Bound::Excluded(upper)))
            .map(|((_, _, open_time), _)| *open_time)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn candle_at(hour: u32) -> Candle {
        Candle::new(
            "ETHUSDT",
            Timeframe::H1,
            Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            dec!(3000),
            dec!(3100),
            dec!(2950),
            dec!(3050),
            dec!(100),
        )
    }

    #[tokio::test]
    async fn test_upsert_and_exists() {
        let store = MemoryCandleStore::new();
        let candle = candle_at(0);

        let affected = store.upsert_batch(&[candle.clone()]).await.unwrap();
        assert_eq!(affected, 1);
        assert!(store
            .exists("ETHUSDT", Timeframe::H1, candle.open_time)
            .await
            .unwrap());
        assert!(!store
            .exists("BTCUSDT", Timeframe::H1, candle.open_time)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryCandleStore::new();
        let batch = vec![candle_at(0), candle_at(1)];

        store.upsert_batch(&batch).await.unwrap();
        store.upsert_batch(&batch).await.unwrap();

        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_range_queries_half_open() {
        let store = MemoryCandleStore::new();
        store
            .upsert_batch(&[candle_at(0), candle_at(1), candle_at(2), candle_at(3)])
            .await
            .unwrap();

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();

        let count = store
            .range_count("ETHUSDT", Timeframe::H1, start, end)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let opens = store
            .open_times_in_range("ETHUSDT", Timeframe::H1, start, end)
            .await
            .unwrap();
        assert_eq!(opens, vec![start, Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap()]);
    }

    #[tokio::test]
    async fn test_range_ignores_other_timeframes() {
        let store = MemoryCandleStore::new();
        let mut m5 = candle_at(0);
        m5.timeframe = Timeframe::M5;
        store.upsert_batch(&[candle_at(0), m5]).await.unwrap();

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        let count = store
            .range_count("ETHUSDT", Timeframe::H1, start, end)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
