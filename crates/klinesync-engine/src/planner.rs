//! 동기화 윈도우 계획.
//!
//! 요청 범위를 업스트림 페이지 한도에 맞는 반개구간 윈도우들로 분할합니다.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use klinesync_core::domain::calendar::align_down;
use klinesync_core::{SyncError, SyncResult, Timeframe};

/// 반개구간 `[start, end)` 페치 윈도우.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWindow {
    /// 윈도우 시작 (포함)
    pub start: DateTime<Utc>,
    /// 윈도우 종료 (배타)
    pub end: DateTime<Utc>,
}

impl SyncWindow {
    /// 새 윈도우 생성.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// 주어진 시각이 이 윈도우 안에 있는지 확인.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

impl std::fmt::Display for SyncWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} .. {})", self.start, self.end)
    }
}

/// 요청 범위를 페치 윈도우들로 타일링합니다.
///
/// 시작은 타임프레임 경계로 내림하고, 각 윈도우는 최대 `page_limit`개의
/// 캔들을 담습니다. 마지막 윈도우는 요청 종료 시각에서 잘립니다.
/// 윈도우들은 시간 순서이며 서로 겹치지 않고 빈틈 없이 범위를 덮습니다.
pub fn plan(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    timeframe: Timeframe,
    page_limit: u32,
) -> SyncResult<Vec<SyncWindow>> {
    if start >= end {
        return Err(SyncError::InvalidRange(format!(
            "start {} must be before end {}",
            start, end
        )));
    }

    let window_span = Duration::seconds(page_limit as i64 * timeframe.as_secs() as i64);
    let mut windows = Vec::new();
    let mut cursor = align_down(start, timeframe);

    while cursor < end {
        let window_end = std::cmp::min(cursor + window_span, end);
        windows.push(SyncWindow::new(cursor, window_end));
        cursor = window_end;
    }

    Ok(windows)
}
