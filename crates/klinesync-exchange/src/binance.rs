//! Binance 거래소 어댑터.
//!
//! Binance Spot REST API(`/api/v3/klines`)에서 과거 캔들 페이지를 조회합니다.
//! 공개 데이터이므로 서명은 필요 없지만, API 키를 설정하면 더 높은
//! 요청 한도를 적용받습니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error};

use klinesync_core::{Candle, Timeframe};

use crate::error::{FetchError, FetchResult};
use crate::traits::MarketDataFetcher;

/// 운영 환경 REST API 기본 URL.
const DEFAULT_BASE_URL: &str = "https://api.binance.com";

// ============================================================================
// 설정
// ============================================================================

/// Binance 어댑터 설정.
///
/// # 보안
/// - `Debug` 구현은 `api_key`를 마스킹합니다.
#[derive(Clone)]
pub struct BinanceConfig {
    /// REST API 기본 URL
    pub base_url: String,
    /// API 키 (선택, 요청 한도 상향용)
    pub api_key: Option<String>,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 페이지당 최대 캔들 수
    pub page_limit: u32,
}

impl fmt::Debug for BinanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinanceConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_deref().map(|_| "***REDACTED***"))
            .field("timeout_secs", &self.timeout_secs)
            .field("page_limit", &self.page_limit)
            .finish()
    }
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: 30,
            page_limit: 1000,
        }
    }
}

impl BinanceConfig {
    /// 환경 변수에서 생성.
    ///
    /// - `BINANCE_BASE_URL`: 기본 URL 오버라이드
    /// - `BINANCE_API_KEY`: 선택적 API 키
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("BINANCE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_key: std::env::var("BINANCE_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout_secs: 30,
            page_limit: 1000,
        }
    }

    /// 요청 타임아웃 설정.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }
}

// ============================================================================
// API 응답 타입
// ============================================================================

/// Binance kline 응답 행 (위치 기반 배열).
#[derive(Debug, Deserialize)]
struct BinanceKline(
    i64,    // 0: Open time
    String, // 1: Open
    String, // 2: High
    String, // 3: Low
    String, // 4: Close
    String, // 5: Volume
    i64,    // 6: Close time
    String, // 7: Quote asset volume
    i64,    // 8: Number of trades
    String, // 9: Taker buy base asset volume
    String, // 10: Taker buy quote asset volume
    String, // 11: Ignore
);

#[derive(Debug, Deserialize)]
struct BinanceError {
    code: i32,
    msg: String,
}

// ============================================================================
// Binance 어댑터
// ============================================================================

/// Binance Spot 과거 데이터 어댑터.
pub struct BinanceFetcher {
    config: BinanceConfig,
    client: Client,
}

impl BinanceFetcher {
    /// 새 어댑터 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `FetchError::Unavailable`을 반환합니다.
    pub fn new(config: BinanceConfig) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Unavailable(format!("HTTP client build failed: {}", e)))?;

        Ok(Self { config, client })
    }

    /// 환경 변수 설정으로 생성.
    pub fn from_env() -> FetchResult<Self> {
        Self::new(BinanceConfig::from_env())
    }

    /// 공개 API 요청 (서명 불필요).
    async fn public_get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> FetchResult<T> {
        let url = format!("{}{}", self.config.base_url, endpoint);
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        let full_url = format!("{}?{}", url, query);

        debug!("GET {}", full_url);

        let mut request = self.client.get(&full_url);
        if let Some(ref key) = self.config.api_key {
            request = request.header("X-MBX-APIKEY", key);
        }

        let response = request.send().await.map_err(FetchError::from)?;
        self.handle_response(response).await
    }

    /// API 응답 처리.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> FetchResult<T> {
        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await.map_err(FetchError::from)?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse response: {} - Body: {}", e, body);
                FetchError::Parse(e.to_string())
            });
        }

        // 429: 한도 초과, 418: 한도 위반 반복으로 인한 IP 차단
        if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
            return Err(FetchError::RateLimited { retry_after });
        }

        if let Ok(api_err) = serde_json::from_str::<BinanceError>(&body) {
            return Err(self.map_error_code(status, api_err.code, &api_err.msg));
        }

        Err(FetchError::Unavailable(format!("HTTP {}: {}", status, body)))
    }

    /// Binance 에러 코드를 FetchError로 매핑.
    fn map_error_code(&self, status: StatusCode, code: i32, msg: &str) -> FetchError {
        match code {
            -1003 => FetchError::RateLimited { retry_after: None },
            // -1100번대: 잘못된 파라미터 (범위/심볼/간격)
            -1100..=-1000 if status == StatusCode::BAD_REQUEST => {
                FetchError::InvalidRange(msg.to_string())
            }
            -1121 => FetchError::InvalidRange(format!("invalid symbol: {}", msg)),
            _ => FetchError::Unavailable(format!("API error {}: {}", code, msg)),
        }
    }

    /// Binance kline 행을 도메인 캔들로 변환.
    fn to_candle(&self, symbol: &str, timeframe: Timeframe, row: BinanceKline) -> FetchResult<Candle> {
        let open_time = DateTime::from_timestamp_millis(row.0)
            .ok_or_else(|| FetchError::Parse(format!("invalid open time: {}", row.0)))?;

        let mut candle = Candle::new(
            symbol,
            timeframe,
            open_time,
            parse_decimal(&row.1)?,
            parse_decimal(&row.2)?,
            parse_decimal(&row.3)?,
            parse_decimal(&row.4)?,
            parse_decimal(&row.5)?,
        );
        candle.quote_volume = Some(parse_decimal(&row.7)?);
        // u32 범위를 벗어나는 값은 잘라내지 않고 미기록으로 처리
        candle.num_trades = u32::try_from(row.8).ok();

        Ok(candle)
    }
}

/// 문자열에서 Decimal 파싱.
fn parse_decimal(s: &str) -> FetchResult<Decimal> {
    s.parse()
        .map_err(|_| FetchError::Parse(format!("invalid decimal: {}", s)))
}

/// Retry-After 헤더 파싱 (초 단위).
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl MarketDataFetcher for BinanceFetcher {
    async fn fetch_page(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> FetchResult<Vec<Candle>> {
        // Binance의 startTime/endTime은 open time 기준 양끝 포함이므로
        // 반개구간 [start, end)를 위해 endTime에서 1ms를 뺀다.
        let start_ms = window_start.timestamp_millis();
        let end_ms = window_end.timestamp_millis() - 1;

        let rows: Vec<BinanceKline> = self
            .public_get(
                "/api/v3/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", timeframe.to_binance_interval().to_string()),
                    ("startTime", start_ms.to_string()),
                    ("endTime", end_ms.to_string()),
                    ("limit", self.config.page_limit.to_string()),
                ],
            )
            .await?;

        debug!(
            symbol = symbol,
            timeframe = %timeframe,
            count = rows.len(),
            "Fetched kline page"
        );

        rows.into_iter()
            .map(|row| self.to_candle(symbol, timeframe, row))
            .collect()
    }
}
