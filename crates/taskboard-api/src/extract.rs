//! 요청 본문 추출기.
//!
//! `axum::Json`의 거부 응답(텍스트)을 [`ApiErrorResponse`] JSON으로 바꿉니다.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use tracing::debug;

use crate::error::{ApiError, ApiErrorResponse};

/// JSON 본문 추출기.
///
/// 본문 파싱에 실패하면 `INVALID_BODY` 코드와 요청 메서드, 경로를 담아 응답합니다.
/// 상태 코드는 axum의 분류(400, 415, 422)를 그대로 따릅니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
    T: Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let method = req.method().clone();
        let uri = req.uri().clone();

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(%method, path = uri.path(), error = %rejection, "Rejected request body");
                Err((
                    rejection.status(),
                    Json(
                        ApiErrorResponse::new("INVALID_BODY", rejection.body_text())
                            .with_request_info(&method, &uri),
                    ),
                ))
            }
        }
    }
}
