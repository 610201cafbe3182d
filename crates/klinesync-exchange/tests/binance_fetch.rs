//! Integration tests for the Binance fetcher against a mock HTTP server.

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

use klinesync_core::Timeframe;
use klinesync_exchange::{BinanceConfig, BinanceFetcher, FetchError, MarketDataFetcher};

fn fetcher_for(server: &mockito::ServerGuard) -> BinanceFetcher {
    let config = BinanceConfig {
        base_url: server.url(),
        ..Default::default()
    };
    BinanceFetcher::new(config).expect("client build")
}

/// 정상 응답: 위치 기반 배열이 도메인 캔들로 변환되어야 한다.
#[tokio::test]
async fn test_fetch_page_parses_klines() {
    let mut server = mockito::Server::new_async().await;

    let body = serde_json::json!([
        [
            1704067200000i64, "3000.0", "3100.0", "2950.0", "3050.0", "123.4",
            1704070799999i64, "400000.0", 800, "60.0", "200000.0", "0"
        ],
        [
            1704070800000i64, "3050.0", "3150.0", "3000.0", "3100.0", "200.0",
            1704074399999i64, "500000.0", 900, "70.0", "250000.0", "0"
        ]
    ]);

    let mock = server
        .mock("GET", "/api/v3/klines")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("symbol".into(), "ETHUSDT".into()),
            mockito::Matcher::UrlEncoded("interval".into(), "1h".into()),
            mockito::Matcher::UrlEncoded("startTime".into(), "1704067200000".into()),
            mockito::Matcher::UrlEncoded("endTime".into(), "1704074399999".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let fetcher = fetcher_for(&server);
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();

    let candles = fetcher
        .fetch_page("ETHUSDT", Timeframe::H1, start, end)
        .await
        .expect("fetch should succeed");

    mock.assert_async().await;

    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].open_time, start);
    assert_eq!(candles[0].open, dec!(3000.0));
    assert_eq!(candles[0].close, dec!(3050.0));
    assert_eq!(candles[0].volume, dec!(123.4));
    assert_eq!(candles[0].quote_volume, Some(dec!(400000.0)));
    assert_eq!(candles[0].num_trades, Some(800));
    assert!(candles[0].is_aligned());
    assert!(candles[0].open_time < candles[1].open_time);
}

/// 429 응답은 Retry-After 헤더를 포함한 RateLimited로 매핑되어야 한다.
#[tokio::test]
async fn test_fetch_page_maps_rate_limit() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/api/v3/klines")
        .match_query(mockito::Matcher::Any)
        .with_status(429)
        .with_header("Retry-After", "7")
        .with_body(r#"{"code":-1003,"msg":"Too many requests."}"#)
        .create_async()
        .await;

    let fetcher = fetcher_for(&server);
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();

    let err = fetcher
        .fetch_page("ETHUSDT", Timeframe::H1, start, end)
        .await
        .unwrap_err();

    match err {
        FetchError::RateLimited { retry_after } => {
            assert_eq!(retry_after, Some(std::time::Duration::from_secs(7)));
        }
        other => panic!("expected RateLimited, got {:?}", other),
    }
}

/// 5xx 응답은 Unavailable로 매핑되어야 한다.
#[tokio::test]
async fn test_fetch_page_maps_server_error() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/api/v3/klines")
        .match_query(mockito::Matcher::Any)
        .with_status(503)
        .with_body("service unavailable")
        .create_async()
        .await;

    let fetcher = fetcher_for(&server);
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();

    let err = fetcher
        .fetch_page("ETHUSDT", Timeframe::H1, start, end)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Unavailable(_)));
}

/// 잘못된 파라미터에 대한 400 응답은 InvalidRange로 매핑되어야 한다.
#[tokio::test]
async fn test_fetch_page_maps_invalid_symbol() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/api/v3/klines")
        .match_query(mockito::Matcher::Any)
        .with_status(400)
        .with_body(r#"{"code":-1121,"msg":"Invalid symbol."}"#)
        .create_async()
        .await;

    let fetcher = fetcher_for(&server);
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();

    let err = fetcher
        .fetch_page("NOPEUSDT", Timeframe::H1, start, end)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::InvalidRange(_)));
}

/// u32 범위를 벗어나는 체결 건수는 잘리지 않고 미기록(None)이어야 한다.
#[tokio::test]
async fn test_fetch_page_oversized_trade_count_is_dropped() {
    let mut server = mockito::Server::new_async().await;

    let body = serde_json::json!([[
        1704067200000i64, "3000.0", "3100.0", "2950.0", "3050.0", "123.4",
        1704070799999i64, "400000.0", 5_000_000_000i64, "60.0", "200000.0", "0"
    ]]);

    let _mock = server
        .mock("GET", "/api/v3/klines")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let fetcher = fetcher_for(&server);
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();

    let candles = fetcher
        .fetch_page("ETHUSDT", Timeframe::H1, start, end)
        .await
        .expect("fetch should succeed");

    assert_eq!(candles.len(), 1);
    assert_eq!(candles[0].num_trades, None);
    assert_eq!(candles[0].quote_volume, Some(dec!(400000.0)));
}

/// 빈 응답은 빈 벡터를 반환해야 한다 (갭 검출은 실행기의 몫).
#[tokio::test]
async fn test_fetch_page_empty_response() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/api/v3/klines")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let fetcher = fetcher_for(&server);
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();

    let candles = fetcher
        .fetch_page("ETHUSDT", Timeframe::H1, start, end)
        .await
        .expect("fetch should succeed");

    assert!(candles.is_empty());
}
