//! 업스트림 시장 데이터 페처.
//!
//! 이 crate는 다음을 제공합니다:
//! - 거래소 중립적 페치 인터페이스 (`MarketDataFetcher`)
//! - Binance Spot REST API 어댑터 (`BinanceFetcher`)

pub mod binance;
pub mod error;
pub mod traits;

pub use binance::{BinanceConfig, BinanceFetcher};
pub use error::{FetchError, FetchResult};
pub use traits::MarketDataFetcher;
