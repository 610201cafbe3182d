//! 환경변수 기반 설정 모듈.
//!
//! 전역 상태 대신 명시적인 설정 구조체를 실행기에 주입합니다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SyncError;

/// 동기화 엔진 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// 동기화 대상 심볼
    pub symbol: String,
    /// 업스트림 페이지당 최대 캔들 수
    pub page_limit: u32,
    /// 윈도우당 재시도 횟수 상한
    pub retry_budget: u32,
    /// 백오프 대기 상한 (초)
    pub max_backoff_secs: u64,
    /// 네트워크 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 윈도우 처리 동시성 (1..=4)
    pub concurrency: usize,
}

/// 허용되는 최대 동시성.
pub const MAX_CONCURRENCY: usize = 4;

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            symbol: "ETHUSDT".to_string(),
            page_limit: 1000,
            retry_budget: 5,
            max_backoff_secs: 60,
            request_timeout_secs: 30,
            concurrency: 1,
        }
    }
}

impl SyncConfig {
    /// 환경변수에서 설정 로드.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            symbol: std::env::var("SYNC_SYMBOL").unwrap_or(defaults.symbol),
            page_limit: env_var_parse("SYNC_PAGE_LIMIT", defaults.page_limit),
            retry_budget: env_var_parse("SYNC_RETRY_BUDGET", defaults.retry_budget),
            max_backoff_secs: env_var_parse("SYNC_MAX_BACKOFF_SECS", defaults.max_backoff_secs),
            request_timeout_secs: env_var_parse(
                "SYNC_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            ),
            concurrency: env_var_parse("SYNC_CONCURRENCY", defaults.concurrency)
                .clamp(1, MAX_CONCURRENCY),
        }
    }

    /// 네트워크 요청 타임아웃을 Duration으로 반환.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 백오프 대기 상한을 Duration으로 반환.
    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }

    /// 설정 값의 유효성을 검사합니다.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.symbol.is_empty() {
            return Err(SyncError::Config("symbol must not be empty".to_string()));
        }
        if self.page_limit == 0 {
            return Err(SyncError::Config("page_limit must be positive".to_string()));
        }
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(SyncError::Config(format!(
                "concurrency must be in 1..={}",
                MAX_CONCURRENCY
            )));
        }
        Ok(())
    }
}

/// 서비스(API/CLI) 공통 설정.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl ServiceConfig {
    /// 환경변수에서 설정 로드.
    pub fn from_env() -> Result<Self, SyncError> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            SyncError::Config("DATABASE_URL environment variable not set".to_string())
        })?;

        Ok(Self {
            database_url,
            host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_var_parse("SERVER_PORT", 8000),
        })
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용).
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
