//! 동기화 실행 endpoint.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

use klinesync_core::{SyncError, Timeframe};
use klinesync_engine::{SyncExecutor, SyncRequest};

use crate::error::ApiError;
use crate::state::AppState;
use crate::time::parse_datetime;

/// `POST /api/sync` 요청 본문.
#[derive(Debug, Deserialize)]
pub struct SyncRequestBody {
    /// 범위 시작 (`YYYY-MM-DD [HH:MM[:SS]]` 또는 RFC 3339)
    pub start: String,
    /// 범위 종료 (배타)
    pub end: String,
    /// 캔들 간격 (기본 "1h")
    #[serde(default)]
    pub interval: Option<String>,
    /// 심볼 (기본: 서버 설정)
    #[serde(default)]
    pub symbol: Option<String>,
}

/// `POST /api/sync` 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    /// 전체 성공 여부
    pub success: bool,
    /// 결과 요약 메시지
    pub message: String,
    /// 처리된 캔들 수 (저장 + 건너뜀)
    pub records_count: usize,
    /// 실패 시 설명
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /api/sync` 핸들러.
///
/// 잘못된 간격/범위/날짜는 400으로 거부합니다. 윈도우 단위 실패는
/// 실행기 안에서 집계되므로 `success=false`인 200 응답으로만 나타납니다.
pub async fn run_sync(
    State(state): State<AppState>,
    Json(body): Json<SyncRequestBody>,
) -> Result<Json<SyncResponse>, ApiError> {
    let interval = body.interval.as_deref().unwrap_or("1h");
    let timeframe = Timeframe::from_str(interval)
        .map_err(|e| ApiError::bad_request("INVALID_INTERVAL", e.to_string()))?;
    let start = parse_datetime(&body.start)
        .map_err(|e| ApiError::bad_request("INVALID_DATE", e.to_string()))?;
    let end = parse_datetime(&body.end)
        .map_err(|e| ApiError::bad_request("INVALID_DATE", e.to_string()))?;
    let symbol = body.symbol.unwrap_or_else(|| state.config.symbol.clone());

    info!(symbol = %symbol, interval = %timeframe, %start, %end, "동기화 요청 수신");

    let request = SyncRequest::new(symbol, timeframe, start, end);
    let executor = SyncExecutor::new(
        state.fetcher.clone(),
        state.store.clone(),
        state.config.clone(),
    );

    let report = match executor.execute(&request).await {
        Ok(report) => report,
        Err(SyncError::InvalidRange(message)) => {
            return Err(ApiError::bad_request("INVALID_RANGE", message));
        }
        Err(e) => return Err(ApiError::internal(e.to_string())),
    };

    let message = if report.success {
        format!(
            "synced {} new candles ({} skipped) for {} {}",
            report.records_written, report.records_skipped_duplicate, request.symbol, timeframe
        )
    } else {
        format!(
            "sync incomplete: {} gap(s) remain for {} {}",
            report.gaps_detected.len(),
            request.symbol,
            timeframe
        )
    };

    Ok(Json(SyncResponse {
        success: report.success,
        message,
        records_count: report.records_count(),
        error: report.error,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::create_router;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::{DateTime, Utc};
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tower::ServiceExt;

    use klinesync_core::domain::calendar::expected_open_times;
    use klinesync_core::{Candle, SyncConfig};
    use klinesync_data::MemoryCandleStore;
    use klinesync_exchange::{FetchResult, MarketDataFetcher};

    /// 요청된 윈도우 전체를 덮는 캔들을 생성하는 테스트 페처.
    struct FakeFetcher;

    #[async_trait]
    impl MarketDataFetcher for FakeFetcher {
        async fn fetch_page(
            &self,
            symbol: &str,
            timeframe: Timeframe,
            window_start: DateTime<Utc>,
            window_end: DateTime<Utc>,
        ) -> FetchResult<Vec<Candle>> {
            Ok(expected_open_times(window_start, window_end, timeframe)
                .into_iter()
                .map(|open| {
                    Candle::new(
                        symbol,
                        timeframe,
                        open,
                        dec!(3000),
                        dec!(3100),
                        dec!(2950),
                        dec!(3050),
                        dec!(10),
                    )
                })
                .collect())
        }
    }

    fn test_app() -> axum::Router {
        let state = AppState::new(
            Arc::new(FakeFetcher),
            Arc::new(MemoryCandleStore::new()),
            SyncConfig::default(),
        );
        create_router(state)
    }

    async fn post_sync(app: axum::Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sync")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_sync_endpoint_reports_written_records() {
        let (status, body) = post_sync(
            test_app(),
            serde_json::json!({
                "start": "2024-01-01",
                "end": "2024-01-01 04:00",
                "interval": "1h"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["records_count"], 4);
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_sync_endpoint_rejects_unknown_interval() {
        let (status, body) = post_sync(
            test_app(),
            serde_json::json!({
                "start": "2024-01-01",
                "end": "2024-01-02",
                "interval": "7m"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INTERVAL");
    }

    #[tokio::test]
    async fn test_sync_endpoint_rejects_inverted_range() {
        let (status, body) = post_sync(
            test_app(),
            serde_json::json!({
                "start": "2024-01-02",
                "end": "2024-01-01"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_RANGE");
    }

    #[tokio::test]
    async fn test_sync_endpoint_rejects_bad_date() {
        let (status, body) = post_sync(
            test_app(),
            serde_json::json!({
                "start": "yesterday",
                "end": "2024-01-02"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_DATE");
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
