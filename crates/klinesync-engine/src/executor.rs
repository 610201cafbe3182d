//! 동기화 실행기.
//!
//! 계획된 윈도우들을 제한된 동시성으로 처리합니다. 윈도우 하나의 실패가
//! 전체 실행을 중단시키지 않으며, 실패한 윈도우는 갭으로 기록됩니다.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use klinesync_core::domain::calendar::expected_open_times;
use klinesync_core::{Candle, SyncConfig, SyncError, SyncResult, MAX_CONCURRENCY};
use klinesync_data::CandleStore;
use klinesync_exchange::{FetchError, MarketDataFetcher};

use crate::planner::{plan, SyncWindow};
use crate::report::SyncReport;
use crate::request::SyncRequest;

/// 재시도 백오프 폴백의 기준 대기 시간.
const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// 윈도우 하나의 처리 결과.
enum WindowOutcome {
    /// 페치·저장 성공 (빈 페이지 포함)
    Completed { written: usize, skipped: usize },
    /// 재시도 예산 소진 또는 복구 불가 오류
    Failed { window: SyncWindow, reason: String },
    /// 취소 신호로 시도하지 않음
    Cancelled { window: SyncWindow },
}

/// 동기화 실행기.
pub struct SyncExecutor {
    fetcher: Arc<dyn MarketDataFetcher>,
    store: Arc<dyn CandleStore>,
    config: SyncConfig,
    cancel: CancellationToken,
}

impl SyncExecutor {
    /// 새 실행기 생성.
    ///
    /// `concurrency`는 `1..=MAX_CONCURRENCY`로 보정됩니다
    /// (`buffered(0)`은 영원히 완료되지 않음).
    pub fn new(
        fetcher: Arc<dyn MarketDataFetcher>,
        store: Arc<dyn CandleStore>,
        mut config: SyncConfig,
    ) -> Self {
        config.concurrency = config.concurrency.clamp(1, MAX_CONCURRENCY);
        Self {
            fetcher,
            store,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// 외부 취소 토큰을 연결합니다.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 동기화 요청을 실행하고 결과 리포트를 반환합니다.
    ///
    /// 잘못된 요청(`InvalidRange`)은 즉시 `Err`로 거부됩니다. 그 외의
    /// 모든 실패(업스트림/저장소 오류)는 리포트에 집계되어 `Ok`로
    /// 반환됩니다.
    pub async fn execute(&self, request: &SyncRequest) -> SyncResult<SyncReport> {
        let started = Instant::now();
        request.validate(Utc::now())?;
        let windows = plan(
            request.start,
            request.end,
            request.timeframe,
            self.config.page_limit,
        )?;

        info!(
            symbol = %request.symbol,
            timeframe = %request.timeframe,
            start = %request.start,
            end = %request.end,
            windows = windows.len(),
            concurrency = self.config.concurrency,
            "동기화 시작"
        );

        let outcomes: Vec<WindowOutcome> = stream::iter(windows)
            .map(|window| self.sync_window(request, window))
            .buffered(self.config.concurrency)
            .collect()
            .await;

        let mut report = SyncReport::default();
        let mut cancelled = false;

        for outcome in outcomes {
            match outcome {
                WindowOutcome::Completed { written, skipped } => {
                    report.records_written += written;
                    report.records_skipped_duplicate += skipped;
                }
                WindowOutcome::Failed { window, reason } => {
                    warn!(window = %window, reason = %reason, "윈도우 실패");
                    report.gaps_detected.push(window);
                }
                WindowOutcome::Cancelled { window } => {
                    debug!(window = %window, "취소로 건너뜀");
                    cancelled = true;
                }
            }
        }

        let failed_count = report.gaps_detected.len();
        let mut residual = Vec::new();
        if !cancelled {
            // 방어적 완전성 검사: 실패 윈도우 밖의 누락 캔들을 갭으로 보고.
            // 검사 자체의 저장소 오류도 리포트로 집계한다 (호출자에게 던지지 않음).
            let skip = report.gaps_detected.clone();
            match self.residual_gaps(request, &skip).await {
                Ok(gaps) => {
                    residual = gaps;
                    report.gaps_detected.extend(residual.iter().copied());
                }
                Err(e) => {
                    warn!(error = %e, "잔여 갭 검사 실패");
                    report.error = Some(format!("residual gap check failed: {}", e));
                }
            }
        }

        report.success =
            !cancelled && report.gaps_detected.is_empty() && report.error.is_none();
        if cancelled {
            report.error = Some("sync cancelled before completion".to_string());
        } else if !report.success && report.error.is_none() {
            report.error = Some(format!(
                "{} window(s) failed, {} residual gap(s) detected",
                failed_count,
                residual.len()
            ));
        }
        report.elapsed = started.elapsed();
        report.log_summary(&request.symbol, request.timeframe.to_binance_interval());
        Ok(report)
    }

    /// 윈도우 하나를 페치·검증·저장합니다.
    ///
    /// `RateLimited`는 재시도 예산 내에서 백오프 후 재시도하고,
    /// 그 외 오류는 즉시 실패로 처리합니다.
    async fn sync_window(&self, request: &SyncRequest, window: SyncWindow) -> WindowOutcome {
        if self.cancel.is_cancelled() {
            return WindowOutcome::Cancelled { window };
        }

        let mut attempt: u32 = 0;
        loop {
            let fetched = tokio::time::timeout(
                self.config.request_timeout(),
                self.fetcher.fetch_page(
                    &request.symbol,
                    request.timeframe,
                    window.start,
                    window.end,
                ),
            )
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::Unavailable(format!(
                    "request timed out after {:?}",
                    self.config.request_timeout()
                )))
            });

            match fetched {
                Ok(candles) => {
                    return match self.merge_page(request, window, candles).await {
                        Ok(outcome) => outcome,
                        Err(e) => WindowOutcome::Failed {
                            window,
                            reason: e.to_string(),
                        },
                    };
                }
                Err(FetchError::RateLimited { retry_after }) if attempt < self.config.retry_budget => {
                    let wait = std::cmp::min(
                        retry_after
                            .unwrap_or_else(|| BACKOFF_BASE * 2u32.saturating_pow(attempt)),
                        self.config.max_backoff(),
                    );
                    attempt += 1;
                    debug!(
                        window = %window,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        "레이트 리밋, 백오프 후 재시도"
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            return WindowOutcome::Cancelled { window };
                        }
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
                Err(e) => {
                    return WindowOutcome::Failed {
                        window,
                        reason: e.to_string(),
                    };
                }
            }
        }
    }

    /// 페치된 페이지를 검증·중복제거하여 저장소에 병합합니다.
    async fn merge_page(
        &self,
        request: &SyncRequest,
        window: SyncWindow,
        candles: Vec<Candle>,
    ) -> SyncResult<WindowOutcome> {
        let existing: HashSet<DateTime<Utc>> = self
            .store
            .open_times_in_range(&request.symbol, request.timeframe, window.start, window.end)
            .await
            .map_err(|e| SyncError::Store(e.to_string()))?
            .into_iter()
            .collect();

        let mut seen: HashSet<DateTime<Utc>> = HashSet::new();
        let mut fresh = Vec::new();
        let mut skipped = 0usize;

        for candle in candles {
            if !self.is_acceptable(&candle, request, window) {
                skipped += 1;
                continue;
            }
            if existing.contains(&candle.open_time) || !seen.insert(candle.open_time) {
                skipped += 1;
                continue;
            }
            fresh.push(candle);
        }

        let written = if fresh.is_empty() {
            0
        } else {
            self.store
                .upsert_batch(&fresh)
                .await
                .map_err(|e| SyncError::Store(e.to_string()))?
        };

        debug!(window = %window, written, skipped, "윈도우 병합 완료");
        Ok(WindowOutcome::Completed { written, skipped })
    }

    /// 캔들이 요청·윈도우 계약을 만족하는지 검증합니다.
    fn is_acceptable(&self, candle: &Candle, request: &SyncRequest, window: SyncWindow) -> bool {
        let ok = candle.symbol == request.symbol
            && candle.timeframe == request.timeframe
            && candle.is_aligned()
            && window.contains(candle.open_time)
            && candle.high >= candle.low;
        if !ok {
            warn!(
                symbol = %candle.symbol,
                open_time = %candle.open_time,
                window = %window,
                "검증 실패 캔들 건너뜀"
            );
        }
        ok
    }

    /// 전체 범위에서 실패 윈도우 밖의 누락 캔들을 찾아 갭 윈도우로 묶습니다.
    async fn residual_gaps(
        &self,
        request: &SyncRequest,
        failed: &[SyncWindow],
    ) -> SyncResult<Vec<SyncWindow>> {
        let expected = expected_open_times(request.start, request.end, request.timeframe);
        let Some(range_start) = expected.first().copied() else {
            return Ok(Vec::new());
        };

        let present: HashSet<DateTime<Utc>> = self
            .store
            .open_times_in_range(&request.symbol, request.timeframe, range_start, request.end)
            .await
            .map_err(|e| SyncError::Store(e.to_string()))?
            .into_iter()
            .collect();

        let missing: Vec<DateTime<Utc>> = expected
            .into_iter()
            .filter(|open| !present.contains(open))
            .filter(|open| !failed.iter().any(|w| w.contains(*open)))
            .collect();

        Ok(coalesce_gaps(&missing, request.timeframe.as_secs()))
    }
}

/// 연속된 누락 시작 시각들을 반개구간 갭 윈도우로 병합합니다.
fn coalesce_gaps(missing: &[DateTime<Utc>], step_secs: u64) -> Vec<SyncWindow> {
    let step = ChronoDuration::seconds(step_secs as i64);
    let mut gaps: Vec<SyncWindow> = Vec::new();

    for &open in missing {
        match gaps.last_mut() {
            Some(last) if last.end == open => last.end = open + step,
            _ => gaps.push(SyncWindow::new(open, open + step)),
        }
    }
    gaps
}
