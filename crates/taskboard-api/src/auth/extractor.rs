//! 핸들러용 인증 추출기.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use taskboard_core::{UserRecord, VerifiedIdentity};
use tracing::error;

use super::AccessDenied;
use crate::error::{not_found, store_error, ApiError};
use crate::state::AppState;

/// 접근 게이트가 첨부한 검증된 신원.
///
/// 토큰을 다시 검증하지 않습니다. 신원이 없으면 게이트를 거치지 않은
/// 라우트이므로 `unauthenticated`로 거부합니다.
///
/// ```rust,ignore
/// async fn handler(Authenticated(identity): Authenticated) -> String {
///     identity.subject_id
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticated(pub VerifiedIdentity);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AccessDenied;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VerifiedIdentity>()
            .cloned()
            .map(Authenticated)
            .ok_or(AccessDenied::Unauthenticated)
    }
}

/// 호출자의 사용자 레코드.
///
/// 디렉터리에 정확히 하나의 레코드가 있어야 하며 그 외에는 404입니다.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRecord);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(identity) = parts.extensions.get::<VerifiedIdentity>() else {
            return Err(not_found("User not found"));
        };

        let mut records = state
            .stores
            .directory
            .find_by_external_id(&identity.subject_id)
            .await
            .map_err(store_error)?;

        match records.len() {
            1 => Ok(CurrentUser(records.remove(0))),
            0 => Err(not_found("User not found")),
            count => {
                error!(
                    subject = %identity.subject_id,
                    count,
                    "Duplicate directory records for subject"
                );
                Err(not_found("User not found"))
            }
        }
    }
}
