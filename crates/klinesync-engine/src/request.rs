//! 동기화 요청 정의와 검증.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use klinesync_core::{SyncError, SyncResult, Timeframe};

/// 단일 동기화 작업 요청.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    /// 동기화 대상 심볼
    pub symbol: String,
    /// 캔들 타임프레임
    pub timeframe: Timeframe,
    /// 범위 시작 (포함)
    pub start: DateTime<Utc>,
    /// 범위 종료 (배타)
    pub end: DateTime<Utc>,
}

impl SyncRequest {
    /// 새 요청 생성.
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            start,
            end,
        }
    }

    /// 요청 범위를 검증합니다.
    ///
    /// 시작은 종료보다 앞서야 하고, 범위는 과거여야 합니다
    /// (미래 캔들은 아직 존재하지 않음).
    pub fn validate(&self, now: DateTime<Utc>) -> SyncResult<()> {
        if self.symbol.is_empty() {
            return Err(SyncError::InvalidRange("symbol must not be empty".to_string()));
        }
        if self.start >= self.end {
            return Err(SyncError::InvalidRange(format!(
                "start {} must be before end {}",
                self.start, self.end
            )));
        }
        if self.end > now {
            return Err(SyncError::InvalidRange(format!(
                "end {} must not be in the future (now: {})",
                self.end, now
            )));
        }
        Ok(())
    }
}
