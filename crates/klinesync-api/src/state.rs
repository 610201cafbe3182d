//! 모든 핸들러에서 공유되는 애플리케이션 상태.

use std::sync::Arc;

use klinesync_core::SyncConfig;
use klinesync_data::CandleStore;
use klinesync_exchange::MarketDataFetcher;

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 업스트림 시장 데이터 페처
    pub fetcher: Arc<dyn MarketDataFetcher>,
    /// 캔들 저장소
    pub store: Arc<dyn CandleStore>,
    /// 동기화 엔진 설정
    pub config: SyncConfig,
}

impl AppState {
    /// 새 상태 생성.
    pub fn new(
        fetcher: Arc<dyn MarketDataFetcher>,
        store: Arc<dyn CandleStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            fetcher,
            store,
            config,
        }
    }
}
