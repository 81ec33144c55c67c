//! API 라우트.
//!
//! 각 모듈은 [`PolicyRouter`]로 라우트와 접근 정책을 함께 등록합니다.
//! [`create_app`]이 정책 테이블로 접근 게이트를 만들어 모든 라우트 앞에 둡니다.

pub mod health;
pub mod roles;
pub mod tasks;
pub mod users;

use std::sync::Arc;

use axum::{middleware, Router};

use crate::auth::{enforce_access, AccessGate, IdentityVerifier, PolicyRouter, RoutePolicy};
use crate::openapi::openapi_json;
use crate::state::AppState;

pub use health::health_router;
pub use roles::roles_router;
pub use tasks::tasks_router;
pub use users::users_router;

/// 전체 API 라우트와 정책 테이블.
pub fn api_routes() -> PolicyRouter<Arc<AppState>> {
    PolicyRouter::new()
        .merge(health_router())
        .merge(users_router())
        .merge(roles_router())
        .merge(tasks_router())
        .get("/api-docs/openapi.json", openapi_json, RoutePolicy::public())
}

/// 접근 게이트가 적용된 애플리케이션 라우터 생성.
///
/// 게이트는 `route_layer`로 붙어 매칭된 라우트에만 실행됩니다.
/// 매칭되지 않은 경로는 게이트 없이 404를 반환합니다.
pub fn create_app<I, P>(
    state: Arc<AppState>,
    verifier: Arc<dyn IdentityVerifier>,
    exempt_paths: I,
) -> Router
where
    I: IntoIterator<Item = P>,
    P: Into<String>,
{
    let (router, table) = api_routes().into_parts();
    let gate = Arc::new(
        AccessGate::new(verifier, state.stores.directory.clone(), table)
            .with_exempt_paths(exempt_paths),
    );

    router
        .route_layer(middleware::from_fn_with_state(gate, enforce_access))
        .with_state(state)
}
