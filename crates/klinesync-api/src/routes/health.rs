//! 헬스 체크 endpoint.
//!
//! 로드밸런서나 오케스트레이션 시스템에서 사용됩니다.

use axum::Json;
use serde::{Deserialize, Serialize};

/// 헬스 체크 응답 구조체.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 서비스 상태 ("healthy")
    pub status: String,
    /// API 버전
    pub version: String,
    /// 현재 시간 (ISO 8601)
    pub timestamp: String,
}

/// 서비스 정보 응답 구조체.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfoResponse {
    /// 서비스 이름
    pub service: String,
    /// API 버전
    pub version: String,
    /// 제공 엔드포인트 목록
    pub endpoints: Vec<String>,
}

/// `GET /api/health` 핸들러.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `GET /` 핸들러.
pub async fn service_info() -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse {
        service: "klinesync".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: vec![
            "GET /api/health".to_string(),
            "POST /api/sync".to_string(),
        ],
    })
}
