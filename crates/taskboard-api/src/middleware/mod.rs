//! API 서버용 HTTP middleware.
//!
//! 접근 제어 미들웨어는 [`crate::auth::enforce_access`]에 있습니다.

mod metrics;

pub use metrics::metrics_layer;
