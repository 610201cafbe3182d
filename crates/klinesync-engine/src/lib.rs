//! 과거 캔들 동기화 엔진.
//!
//! 요청된 시간 범위를 업스트림 페이지 한도에 맞는 윈도우로 분할하고,
//! 각 윈도우를 페치·검증·중복제거하여 저장소에 병합한 뒤 결과 리포트를
//! 반환합니다.
//!
//! # 데이터 흐름
//!
//! ```text
//! SyncRequest → plan() → SyncExecutor ── fetch ──> MarketDataFetcher
//!                              │
//!                              ├── validate / dedup
//!                              ├── upsert ──> CandleStore
//!                              └──> SyncReport
//! ```

pub mod executor;
pub mod planner;
pub mod report;
pub mod request;

pub use executor::SyncExecutor;
pub use planner::{plan, SyncWindow};
pub use report::SyncReport;
pub use request::SyncRequest;
