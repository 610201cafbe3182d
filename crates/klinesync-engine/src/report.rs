//! 동기화 실행 결과 리포트.

use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::planner::SyncWindow;

/// 한 번의 동기화 실행 결과.
///
/// `success`는 모든 윈도우가 성공하고 잔여 갭이 없을 때만 true입니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// 전체 성공 여부
    pub success: bool,
    /// 새로 저장된 캔들 수
    pub records_written: usize,
    /// 중복 또는 검증 실패로 건너뛴 캔들 수
    pub records_skipped_duplicate: usize,
    /// 실패한 윈도우와 잔여 갭
    pub gaps_detected: Vec<SyncWindow>,
    /// 실패 시 사람이 읽을 수 있는 설명
    pub error: Option<String>,
    /// 실행 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl SyncReport {
    /// 처리된 전체 캔들 수 (저장 + 건너뜀).
    pub fn records_count(&self) -> usize {
        self.records_written + self.records_skipped_duplicate
    }

    /// 실행 결과를 로그로 남깁니다.
    pub fn log_summary(&self, symbol: &str, timeframe: &str) {
        if self.success {
            info!(
                symbol = %symbol,
                timeframe = %timeframe,
                written = self.records_written,
                skipped = self.records_skipped_duplicate,
                elapsed_ms = self.elapsed.as_millis() as u64,
                "동기화 완료"
            );
        } else {
            warn!(
                symbol = %symbol,
                timeframe = %timeframe,
                written = self.records_written,
                skipped = self.records_skipped_duplicate,
                gaps = self.gaps_detected.len(),
                error = self.error.as_deref().unwrap_or("unknown"),
                elapsed_ms = self.elapsed.as_millis() as u64,
                "동기화 미완료"
            );
        }
    }
}
