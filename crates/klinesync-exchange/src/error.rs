//! 페처 에러 타입.

use std::time::Duration;
use thiserror::Error;

/// 업스트림 페치 관련 에러.
#[derive(Debug, Error)]
pub enum FetchError {
    /// 요청 한도 초과
    #[error("Rate limit exceeded")]
    RateLimited {
        /// 업스트림이 알려준 재시도 대기 시간 (Retry-After)
        retry_after: Option<Duration>,
    },

    /// 업스트림/네트워크 장애 (타임아웃 포함)
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    /// 업스트림이 거부한 요청 범위
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// 응답 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    Parse(String),
}

/// 페치 작업을 위한 Result 타입.
pub type FetchResult<T> = Result<T, FetchError>;

impl FetchError {
    /// 같은 윈도우를 재시도할 가치가 있는 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            FetchError::Unavailable(err.to_string())
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Unavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rate_limit_is_retryable() {
        assert!(FetchError::RateLimited { retry_after: None }.is_retryable());
        assert!(!FetchError::Unavailable("down".to_string()).is_retryable());
        assert!(!FetchError::InvalidRange("bad".to_string()).is_retryable());
    }
}
