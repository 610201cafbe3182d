//! 인터벌 캘린더.
//!
//! 타임스탬프를 타임프레임 경계에 정렬하고, 구간 내 기대 캔들 시작 시각의
//! 결정적 수열을 계산합니다. 갭 검출과 페치 윈도우 계획의 기반이 됩니다.

use chrono::{DateTime, Utc};

use crate::types::Timeframe;

/// 타임스탬프를 가장 최근의 타임프레임 경계로 내림합니다.
///
/// 모든 타임프레임은 고정 길이이므로 유닉스 에포크 기준 나머지 연산으로
/// 정렬합니다 (에포크는 UTC 자정이므로 일봉 경계와도 일치).
pub fn align_down(instant: DateTime<Utc>, timeframe: Timeframe) -> DateTime<Utc> {
    let step = timeframe.as_secs() as i64;
    let ts = instant.timestamp();
    let floored = ts - ts.rem_euclid(step);
    DateTime::from_timestamp(floored, 0).unwrap_or(instant)
}

/// `[align_down(start), end)` 구간의 정렬된 캔들 시작 시각을 모두 반환합니다.
///
/// 유한하고 결정적이며, 같은 입력은 항상 같은 수열을 만듭니다.
pub fn expected_open_times(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    timeframe: Timeframe,
) -> Vec<DateTime<Utc>> {
    let step = chrono::Duration::seconds(timeframe.as_secs() as i64);
    let mut opens = Vec::new();
    let mut cursor = align_down(start, timeframe);
    while cursor < end {
        opens.push(cursor);
        cursor += step;
    }
    opens
}
