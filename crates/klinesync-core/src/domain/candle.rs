//! OHLCV 캔들스틱 데이터.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::calendar::align_down;
use crate::types::Timeframe;

/// OHLCV 캔들스틱 데이터.
///
/// (symbol, timeframe, open_time) 조합이 고유 식별자입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 거래 심볼 (예: "ETHUSDT")
    pub symbol: String,
    /// 타임프레임
    pub timeframe: Timeframe,
    /// 캔들 시작 시간
    pub open_time: DateTime<Utc>,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 거래량 (기준 자산 단위)
    pub volume: Decimal,
    /// 캔들 종료 시간
    pub close_time: DateTime<Utc>,
    /// 거래대금 (호가 자산 단위)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_volume: Option<Decimal>,
    /// 체결 건수
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_trades: Option<u32>,
}

impl Candle {
    /// 새 캔들을 생성합니다.
    ///
    /// `close_time`은 `open_time + timeframe.duration()`으로 유도됩니다.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        open_time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        let close_time = open_time + chrono::Duration::seconds(timeframe.as_secs() as i64);
        Self {
            symbol: symbol.into(),
            timeframe,
            open_time,
            open,
            high,
            low,
            close,
            volume,
            close_time,
            quote_volume: None,
            num_trades: None,
        }
    }

    /// `open_time`이 타임프레임 경계에 정렬되어 있는지 확인합니다.
    pub fn is_aligned(&self) -> bool {
        align_down(self.open_time, self.timeframe) == self.open_time
    }

    /// 캔들이 `[start, end)` 구간 안에 있는지 확인합니다.
    pub fn is_within(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.open_time >= start && self.open_time < end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn candle_at(open_time: DateTime<Utc>) -> Candle {
        Candle::new(
            "ETHUSDT",
            Timeframe::H1,
            open_time,
            dec!(3000),
            dec!(3100),
            dec!(2950),
            dec!(3050),
            dec!(123.4),
        )
    }

    #[test]
    fn test_close_time_derived() {
        let open_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let candle = candle_at(open_time);
        assert_eq!(
            candle.close_time,
            Utc.with_ymd_and_hms(2024, 1, 1, 13, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_alignment_check() {
        let aligned = candle_at(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        assert!(aligned.is_aligned());

        let misaligned = candle_at(Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap());
        assert!(!misaligned.is_aligned());
    }

    #[test]
    fn test_is_within_half_open() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 4, 0, 0).unwrap();

        assert!(candle_at(start).is_within(start, end));
        assert!(!candle_at(end).is_within(start, end));
    }
}
