//! 캔들 저장소 인터페이스.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use klinesync_core::{Candle, Timeframe};

use crate::error::StoreResult;

/// (symbol, timeframe, open_time) 키 기반 캔들 저장소.
///
/// # 계약
///
/// - `upsert_batch`는 insert-or-replace 의미를 가지며 호출 단위로 원자적입니다
///   (윈도우 단위 all-or-nothing). 닫힌 윈도우의 데이터는 정당하게 변하지
///   않으므로, 교체는 재시도로 인한 중복 페치를 흡수하기 위한 것입니다.
/// - 동일한 값으로 반복 upsert해도 데이터는 변하지 않습니다.
/// - 구현은 동시 호출에 안전해야 합니다.
/// - 삭제 연산은 제공하지 않습니다.
#[async_trait]
pub trait CandleStore: Send + Sync {
    /// 캔들 묶음을 원자적으로 upsert하고 영향받은 행 수를 반환합니다.
    async fn upsert_batch(&self, candles: &[Candle]) -> StoreResult<usize>;

    /// 해당 키의 캔들이 존재하는지 확인합니다.
    async fn exists(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        open_time: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// `[start, end)` 구간의 캔들 수를 반환합니다.
    async fn range_count(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<u64>;

    /// `[start, end)` 구간에 존재하는 open_time을 오름차순으로 반환합니다.
    ///
    /// 중복 검출과 잔여 갭 검사에 사용됩니다.
    async fn open_times_in_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<DateTime<Utc>>>;
}
