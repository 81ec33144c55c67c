//! 태스크 API 라우트
//!
//! 모든 작업은 호출자 소유 태스크로 한정됩니다.
//!
//! - `GET /tasks` - 내 태스크 목록
//! - `POST /tasks` - 태스크 생성
//! - `PUT /tasks/{id}` - 태스크 수정
//! - `DELETE /tasks/{id}` - 태스크 삭제

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_core::{Task, TaskInput};
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::auth::{CurrentUser, PolicyRouter, RoutePolicy};
use crate::error::{not_found, store_error, validation_error, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

// ================================================================================================
// Request/Response Types
// ================================================================================================

/// 태스크 생성/수정 요청
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_date_range", skip_on_field_errors = true))]
pub struct TaskRequest {
    #[validate(length(min = 1, max = 256, message = "제목은 1-256자여야 합니다"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    /// 우선순위 (0~5)
    #[serde(default)]
    #[validate(range(min = 0, max = 5, message = "우선순위는 0-5 사이여야 합니다"))]
    pub priority: Option<i16>,
}

fn validate_date_range(request: &TaskRequest) -> Result<(), ValidationError> {
    match (request.start_date, request.end_date) {
        (Some(start), Some(end)) if end < start => {
            let mut err = ValidationError::new("date_range");
            err.message = Some("종료일은 시작일 이후여야 합니다".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

impl From<TaskRequest> for TaskInput {
    fn from(request: TaskRequest) -> Self {
        TaskInput {
            title: request.title,
            description: request.description,
            start_date: request.start_date,
            end_date: request.end_date,
            completed: request.completed,
            priority: request.priority,
        }
    }
}

/// 태스크 목록 응답
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub total: usize,
}

/// 삭제 응답
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteTaskResponse {
    pub id: Uuid,
    pub deleted: bool,
}

// ================================================================================================
// Handlers
// ================================================================================================

/// 내 태스크 목록
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "태스크 목록", body = TaskListResponse),
        (status = 404, description = "사용자 레코드 없음", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks = state
        .stores
        .tasks
        .list_tasks(user.id)
        .await
        .map_err(store_error)?;
    let total = tasks.len();

    debug!(user_id = %user.id, total, "Tasks listed");
    Ok(Json(TaskListResponse { tasks, total }))
}

/// 태스크 생성
#[utoipa::path(
    post,
    path = "/tasks",
    tag = "tasks",
    security(("bearer" = [])),
    request_body = TaskRequest,
    responses(
        (status = 201, description = "생성됨", body = Task),
        (status = 422, description = "검증 실패", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<TaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    request.validate().map_err(validation_error)?;

    let task = state
        .stores
        .tasks
        .create_task(Task::new(user.id, request.into()))
        .await
        .map_err(store_error)?;

    info!(user_id = %user.id, task_id = %task.id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// 태스크 수정
///
/// 다른 사용자의 태스크는 존재하지 않는 것과 같게 취급합니다.
#[utoipa::path(
    put,
    path = "/tasks/{id}",
    tag = "tasks",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "태스크 ID")),
    request_body = TaskRequest,
    responses(
        (status = 200, description = "수정됨", body = Task),
        (status = 404, description = "없음", body = crate::error::ApiErrorResponse),
        (status = 422, description = "검증 실패", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<TaskRequest>,
) -> ApiResult<Json<Task>> {
    request.validate().map_err(validation_error)?;

    let task = state
        .stores
        .tasks
        .update_task(id, user.id, request.into())
        .await
        .map_err(store_error)?
        .ok_or_else(|| not_found("Task not found"))?;

    debug!(user_id = %user.id, task_id = %id, "Task updated");
    Ok(Json(task))
}

/// 태스크 삭제
#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = "tasks",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "태스크 ID")),
    responses(
        (status = 200, description = "삭제됨", body = DeleteTaskResponse),
        (status = 404, description = "없음", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteTaskResponse>> {
    let deleted = state
        .stores
        .tasks
        .delete_task(id, user.id)
        .await
        .map_err(store_error)?;
    if !deleted {
        return Err(not_found("Task not found"));
    }

    info!(user_id = %user.id, task_id = %id, "Task deleted");
    Ok(Json(DeleteTaskResponse { id, deleted }))
}

/// 태스크 라우터 생성
pub fn tasks_router() -> PolicyRouter<Arc<AppState>> {
    PolicyRouter::new()
        .get("/tasks", list_tasks, RoutePolicy::authenticated())
        .post("/tasks", create_task, RoutePolicy::authenticated())
        .put("/tasks/{id}", update_task, RoutePolicy::authenticated())
        .delete("/tasks/{id}", delete_task, RoutePolicy::authenticated())
}
