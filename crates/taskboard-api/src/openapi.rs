//! OpenAPI 문서화 설정.
//!
//! utoipa로 REST API의 OpenAPI 3.0 스펙을 생성하고
//! `/api-docs/openapi.json`에서 제공합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::error::ApiErrorResponse;
use crate::routes::{
    health::{ComponentHealth, ComponentStatus, HealthResponse, StatusResponse},
    roles::{CreateRoleRequest, RoleListResponse},
    tasks::{DeleteTaskResponse, TaskListResponse, TaskRequest},
    users::{DeleteAccountResponse, DeviceTokenRequest, UserListResponse},
};
use taskboard_core::{Role, Task, UserRecord, VerifiedIdentity};

/// Taskboard API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Taskboard API",
        description = r#"
# Taskboard REST API

사용자별 태스크 관리 API입니다.

## 인증

`/health/*`, `/metrics`, `/api-docs/*`를 제외한 모든 엔드포인트는
ID 공급자가 발급한 토큰이 필요합니다.
`Authorization: Bearer <token>` 헤더를 포함하세요.

관리자 엔드포인트(`/user/all`, `/user-role`)는 `admin` 역할이 필요합니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "로컬 개발 서버"),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "users", description = "사용자 - 계정 설정 및 조회"),
        (name = "roles", description = "역할 - 관리자 전용 역할 관리"),
        (name = "tasks", description = "태스크 - 내 태스크 CRUD")
    ),
    components(
        schemas(
            // ===== Health =====
            StatusResponse,
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            // ===== Common =====
            ApiErrorResponse,
            VerifiedIdentity,

            // ===== Users / Roles =====
            UserRecord,
            Role,
            UserListResponse,
            DeviceTokenRequest,
            DeleteAccountResponse,
            RoleListResponse,
            CreateRoleRequest,

            // ===== Tasks =====
            Task,
            TaskRequest,
            TaskListResponse,
            DeleteTaskResponse,
        )
    ),
    paths(
        crate::routes::health::health_status,
        crate::routes::health::health_ready,

        crate::routes::users::get_me,
        crate::routes::users::setup_user,
        crate::routes::users::delete_me,
        crate::routes::users::complete_first_login,
        crate::routes::users::update_device_token,
        crate::routes::users::list_users,

        crate::routes::roles::list_roles,
        crate::routes::roles::create_role,

        crate::routes::tasks::list_tasks,
        crate::routes::tasks::create_task,
        crate::routes::tasks::update_task,
        crate::routes::tasks::delete_task,
    )
)]
pub struct ApiDoc;

/// 베어러 토큰 보안 스킴 등록.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI JSON 스펙.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
