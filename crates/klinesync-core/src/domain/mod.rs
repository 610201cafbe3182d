//! 동기화 도메인 모델.
//!
//! - `Candle` - OHLCV 캔들스틱 데이터
//! - `calendar` - 인터벌 정렬 및 기대 시각 계산

pub mod calendar;
pub mod candle;

pub use calendar::{align_down, expected_open_times};
pub use candle::Candle;
