//! 애플리케이션 상태.
//!
//! 모든 핸들러에서 `State<Arc<AppState>>`로 공유됩니다.

use std::time::Instant;

use metrics_exporter_prometheus::PrometheusHandle;
use taskboard_core::Stores;

/// 핸들러 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 저장소 핸들 묶음
    pub stores: Stores,
    /// Prometheus 렌더링 핸들 (레코더가 설치된 경우)
    pub metrics: Option<PrometheusHandle>,
    /// 서버 시작 시각
    pub started_at: Instant,
    /// 서버 버전
    pub version: String,
}

impl AppState {
    pub fn new(stores: Stores) -> Self {
        Self {
            stores,
            metrics: None,
            started_at: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// 서버 가동 시간 (초).
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.stores.health.backend_name())
            .field("has_metrics", &self.metrics.is_some())
            .field("version", &self.version)
            .finish()
    }
}
