//! 역할 관리 API 라우트 (admin 전용)
//!
//! - `GET /user-role` - 역할 목록
//! - `POST /user-role` - 역할 생성

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskboard_core::{Role, ADMIN_ROLE};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{PolicyRouter, RoutePolicy};
use crate::error::{store_error, validation_error, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

/// 역할 생성 요청
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 64, message = "역할 이름은 1-64자여야 합니다"))]
    pub name: String,
}

/// 역할 목록 응답
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleListResponse {
    pub roles: Vec<Role>,
    pub total: usize,
}

/// 역할 목록 조회
#[utoipa::path(
    get,
    path = "/user-role",
    tag = "roles",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "역할 목록", body = RoleListResponse),
        (status = 403, description = "권한 없음")
    )
)]
pub async fn list_roles(State(state): State<Arc<AppState>>) -> ApiResult<Json<RoleListResponse>> {
    let roles = state.stores.roles.list_roles().await.map_err(store_error)?;
    let total = roles.len();

    Ok(Json(RoleListResponse { roles, total }))
}

/// 역할 생성
#[utoipa::path(
    post,
    path = "/user-role",
    tag = "roles",
    security(("bearer" = [])),
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "생성됨", body = Role),
        (status = 409, description = "같은 이름의 역할 존재", body = crate::error::ApiErrorResponse),
        (status = 422, description = "검증 실패", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn create_role(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<Role>)> {
    request.validate().map_err(validation_error)?;

    let role = state
        .stores
        .roles
        .create_role(&request.name)
        .await
        .map_err(store_error)?;

    info!(role = %role.name, "Role created");
    Ok((StatusCode::CREATED, Json(role)))
}

/// 역할 라우터 생성
pub fn roles_router() -> PolicyRouter<Arc<AppState>> {
    PolicyRouter::new()
        .get("/user-role", list_roles, RoutePolicy::role(ADMIN_ROLE))
        .post("/user-role", create_role, RoutePolicy::role(ADMIN_ROLE))
}
