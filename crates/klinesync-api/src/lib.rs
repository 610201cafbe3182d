//! 캔들 동기화 REST API.
//!
//! Axum 기반 HTTP 레이어를 제공합니다:
//! - `GET /` - 서비스 정보
//! - `GET /api/health` - 헬스 체크
//! - `POST /api/sync` - 과거 캔들 동기화 실행

pub mod error;
pub mod routes;
pub mod state;
pub mod time;

pub use routes::create_router;
pub use state::AppState;
