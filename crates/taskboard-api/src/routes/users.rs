//! 사용자 API 라우트
//!
//! # 엔드포인트
//!
//! - `GET /user` - 내 사용자 레코드 조회
//! - `POST /user/setup` - 내 사용자 레코드 생성 (기본 역할 부여)
//! - `DELETE /user/delete` - 내 레코드 및 태스크 삭제
//! - `POST /user/firstLogin` - 첫 로그인 완료 표시
//! - `PUT /user/updateDeviceToken` - 디바이스 토큰 등록
//! - `GET /user/all` - 전체 사용자 조회 (admin)

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskboard_core::{UserRecord, ADMIN_ROLE, DEFAULT_USER_ROLE};
use tracing::{debug, error, info};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{Authenticated, CurrentUser, PolicyRouter, RoutePolicy};
use crate::error::{api_error, bad_request, store_error, validation_error, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

// ================================================================================================
// Request/Response Types
// ================================================================================================

/// 디바이스 토큰 등록 요청
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeviceTokenRequest {
    #[validate(length(min = 1, max = 4096, message = "디바이스 토큰은 1-4096자여야 합니다"))]
    pub device_token: String,
}

/// 사용자 목록 응답
#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserRecord>,
    pub total: usize,
}

/// 계정 삭제 응답
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteAccountResponse {
    pub deleted: bool,
    /// 함께 삭제된 태스크 수
    pub tasks_deleted: u64,
}

// ================================================================================================
// Handlers
// ================================================================================================

/// 내 사용자 레코드 조회
#[utoipa::path(
    get,
    path = "/user",
    tag = "users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "사용자 레코드", body = UserRecord),
        (status = 404, description = "레코드 없음", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserRecord> {
    Json(user)
}

/// 내 사용자 레코드 생성
///
/// 검증된 신원 정보로 레코드를 만들고 기본 역할을 부여합니다.
#[utoipa::path(
    post,
    path = "/user/setup",
    tag = "users",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "생성됨", body = UserRecord),
        (status = 400, description = "이미 존재함", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn setup_user(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
) -> ApiResult<(StatusCode, Json<UserRecord>)> {
    let existing = state
        .stores
        .directory
        .find_by_external_id(&identity.subject_id)
        .await
        .map_err(store_error)?;
    if !existing.is_empty() {
        return Err(bad_request("User already exists"));
    }

    let role = state
        .stores
        .roles
        .find_role_by_name(DEFAULT_USER_ROLE)
        .await
        .map_err(store_error)?
        .ok_or_else(|| {
            error!(role = DEFAULT_USER_ROLE, "Default role is not provisioned");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "ROLE_MISSING",
                "Default role is not configured",
            )
        })?;

    let user = state
        .stores
        .users
        .create_user(UserRecord::from_identity(&identity, vec![role]))
        .await
        .map_err(store_error)?;

    info!(user_id = %user.id, subject = %identity.subject_id, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// 내 계정 삭제
/// 내 레코드와 태스크 삭제
///
/// 로컬 데이터만 삭제합니다. ID 공급자 쪽 계정은 남아 있으며
/// 같은 토큰으로 `/user/setup`을 다시 호출하면 새 레코드가 생성됩니다.
#[utoipa::path(
    delete,
    path = "/user/delete",
    tag = "users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "삭제됨", body = DeleteAccountResponse),
        (status = 404, description = "레코드 없음", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<DeleteAccountResponse>> {
    let tasks_deleted = state
        .stores
        .tasks
        .delete_tasks_for_owner(user.id)
        .await
        .map_err(store_error)?;
    state
        .stores
        .users
        .delete_user(user.id)
        .await
        .map_err(store_error)?;

    info!(user_id = %user.id, tasks_deleted, "User deleted");
    Ok(Json(DeleteAccountResponse {
        deleted: true,
        tasks_deleted,
    }))
}

/// 첫 로그인 완료 표시
#[utoipa::path(
    post,
    path = "/user/firstLogin",
    tag = "users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "갱신됨", body = UserRecord),
        (status = 404, description = "레코드 없음", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn complete_first_login(
    State(state): State<Arc<AppState>>,
    CurrentUser(mut user): CurrentUser,
) -> ApiResult<Json<UserRecord>> {
    user.first_login = false;
    user.touch();
    state
        .stores
        .users
        .update_user(&user)
        .await
        .map_err(store_error)?;

    debug!(user_id = %user.id, "First login completed");
    Ok(Json(user))
}

/// 디바이스 토큰 등록
///
/// 이미 등록된 토큰이면 변경 없이 현재 레코드를 반환합니다.
#[utoipa::path(
    put,
    path = "/user/updateDeviceToken",
    tag = "users",
    security(("bearer" = [])),
    request_body = DeviceTokenRequest,
    responses(
        (status = 200, description = "갱신됨", body = UserRecord),
        (status = 404, description = "레코드 없음", body = crate::error::ApiErrorResponse),
        (status = 422, description = "검증 실패", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn update_device_token(
    State(state): State<Arc<AppState>>,
    CurrentUser(mut user): CurrentUser,
    ApiJson(request): ApiJson<DeviceTokenRequest>,
) -> ApiResult<Json<UserRecord>> {
    request.validate().map_err(validation_error)?;

    if user.device_tokens.contains(&request.device_token) {
        return Ok(Json(user));
    }

    user.device_tokens.push(request.device_token);
    user.touch();
    state
        .stores
        .users
        .update_user(&user)
        .await
        .map_err(store_error)?;

    debug!(user_id = %user.id, tokens = user.device_tokens.len(), "Device token registered");
    Ok(Json(user))
}

/// 전체 사용자 조회 (admin)
#[utoipa::path(
    get,
    path = "/user/all",
    tag = "users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "사용자 목록", body = UserListResponse),
        (status = 403, description = "권한 없음")
    )
)]
pub async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<Json<UserListResponse>> {
    let users = state.stores.users.list_users().await.map_err(store_error)?;
    let total = users.len();

    Ok(Json(UserListResponse { users, total }))
}

/// 사용자 라우터 생성
pub fn users_router() -> PolicyRouter<Arc<AppState>> {
    PolicyRouter::new()
        .get("/user", get_me, RoutePolicy::authenticated())
        .post("/user/setup", setup_user, RoutePolicy::authenticated())
        .delete("/user/delete", delete_me, RoutePolicy::authenticated())
        .post(
            "/user/firstLogin",
            complete_first_login,
            RoutePolicy::authenticated(),
        )
        .put(
            "/user/updateDeviceToken",
            update_device_token,
            RoutePolicy::authenticated(),
        )
        .get("/user/all", list_users, RoutePolicy::role(ADMIN_ROLE))
}
