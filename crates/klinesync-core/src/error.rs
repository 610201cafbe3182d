//! 동기화 시스템의 에러 타입.

use std::time::Duration;
use thiserror::Error;

/// 핵심 동기화 에러.
#[derive(Debug, Error)]
pub enum SyncError {
    /// 인식할 수 없는 캔들 간격
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// 잘못된 시간 범위 (start >= end 또는 미래 종료 시각)
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// 요청 한도 초과 (재시도 가능)
    #[error("Rate limit exceeded")]
    RateLimited {
        /// 업스트림이 알려준 재시도 대기 시간
        retry_after: Option<Duration>,
    },

    /// 업스트림/네트워크 장애
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    /// 업스트림이 반환한 캔들의 형식 오류
    #[error("Validation failure: {0}")]
    ValidationFailure(String),

    /// 저장소 에러
    #[error("Store error: {0}")]
    Store(String),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 호출자에 의한 취소
    #[error("Sync cancelled")]
    Cancelled,
}

/// 동기화 작업을 위한 Result 타입.
pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::RateLimited { .. } | SyncError::Unavailable(_)
        )
    }

    /// 요청 자체를 거부해야 하는 에러인지 확인합니다.
    ///
    /// 이 에러들은 부분 작업 없이 즉시 호출자에게 반환됩니다.
    pub fn rejects_request(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidInterval(_) | SyncError::InvalidRange(_)
        )
    }
}
