//! 거래소 중립적 페치 인터페이스.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use klinesync_core::{Candle, Timeframe};

use crate::error::FetchResult;

/// 과거 캔들 데이터 페처 trait.
///
/// # 계약
///
/// - 반환되는 캔들은 `[window_start, window_end)` 구간에 엄격히 포함됩니다.
/// - `open_time` 오름차순으로 정렬되어 있습니다.
/// - 개수는 업스트림 페이지 한도를 넘지 않습니다.
#[async_trait]
pub trait MarketDataFetcher: Send + Sync {
    /// 한 윈도우의 캔들 페이지를 조회합니다.
    async fn fetch_page(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> FetchResult<Vec<Candle>>;
}
