//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `GET /` - 서비스 정보
//! - `GET /api/health` - 헬스 체크
//! - `POST /api/sync` - 과거 캔들 동기화 실행

pub mod health;
pub mod sync;

pub use health::{HealthResponse, ServiceInfoResponse};
pub use sync::{SyncRequestBody, SyncResponse};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::service_info))
        .route("/api/health", get(health::health_check))
        .route("/api/sync", post(sync::run_sync))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
