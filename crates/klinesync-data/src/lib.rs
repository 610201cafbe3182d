//! 캔들 데이터 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - `CandleStore` trait - (symbol, timeframe, open_time) 키 기반 멱등 upsert 저장소
//! - `PgCandleStore` - PostgreSQL 구현 (sqlx)
//! - `MemoryCandleStore` - 테스트/오프라인용 인메모리 구현

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryCandleStore;
pub use postgres::PgCandleStore;
pub use store::CandleStore;
