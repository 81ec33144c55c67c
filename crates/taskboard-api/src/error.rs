//! 통합 API 에러 응답 타입.
//!
//! 라우트 핸들러에서 일관된 에러 형식을 제공합니다.
//! 접근 제어 거부 응답은 [`crate::auth::AccessDenied`]가 따로 담당합니다.

use axum::{
    http::{Method, StatusCode, Uri},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskboard_core::StoreError;
use tracing::error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// 통합 API 에러 응답.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Task not found",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "DB_ERROR", "VALIDATION_ERROR", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// 요청 메서드 (본문 추출 실패 시 기록)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// 요청 경로 (쿼리 제외)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
            method: None,
            path: None,
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    /// 요청 정보(메서드, 경로)를 추가합니다.
    #[must_use]
    pub fn with_request_info(mut self, method: &Method, uri: &Uri) -> Self {
        self.method = Some(method.to_string());
        self.path = Some(uri.path().to_string());
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 에러 타입.
pub type ApiError = (StatusCode, Json<ApiErrorResponse>);

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;

pub fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (status, Json(ApiErrorResponse::new(code, message)))
}

pub fn not_found(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "NOT_FOUND", message)
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
}

/// 저장소 에러 → API 에러.
///
/// 백엔드 에러 상세는 로그에만 남기고 응답에는 일반 메시지를 씁니다.
pub fn store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => not_found("Resource not found"),
        StoreError::Conflict(what) => api_error(StatusCode::CONFLICT, "CONFLICT", what),
        StoreError::Backend(detail) => {
            error!(error = %detail, "Store operation failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERROR",
                "Internal storage error",
            )
        }
    }
}

/// 검증 에러 → 422 응답.
///
/// 필드별 메시지를 모아 하나의 문자열로 만들고 원본은 details에 담습니다.
pub fn validation_error(errors: ValidationErrors) -> ApiError {
    let message = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field}: invalid value"))
            })
        })
        .collect::<Vec<_>>()
        .join(", ");
    let details = serde_json::to_value(&errors).unwrap_or(Value::Null);

    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiErrorResponse::with_details(
            "VALIDATION_ERROR",
            message,
            details,
        )),
    )
}
