//! 요청 인증 게이트 및 역할 인가 게이트.
//!
//! 모든 라우트 앞에서 `enforce_access` 미들웨어로 실행됩니다.
//! 검증은 요청마다 한 번만 수행되고, 역할 확인은 첨부된 신원만 사용합니다.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{MatchedPath, OriginalUri, Request, State},
    http::{
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        request::Parts,
        HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use taskboard_core::{UserDirectory, VerifiedIdentity};
use tracing::{debug, error, info, warn};

use super::{IdentityVerifier, RoutePolicy, RouteTable};
use crate::metrics::record_access_decision;

/// 인증 없이 통과하는 기본 예외 경로.
pub const DEFAULT_EXEMPT_PATHS: &[&str] = &["/health/status"];

const BEARER_PREFIX: &str = "Bearer ";

/// 접근 거부 사유.
///
/// 응답 메시지는 일반 문구만 사용하며 검증기 내부 정보를 담지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    /// 자격증명 없음
    #[error("Unauthorized")]
    Unauthenticated,
    /// 자격증명이 있으나 검증 실패
    #[error("Unauthorized")]
    InvalidToken,
    /// 신원은 확인되었으나 권한 없음
    #[error("Forbidden")]
    Forbidden,
}

impl AccessDenied {
    /// 사유 코드 (`unauthenticated`, `invalid_token`, `forbidden`).
    pub fn reason_code(&self) -> &'static str {
        match self {
            AccessDenied::Unauthenticated => "unauthenticated",
            AccessDenied::InvalidToken => "invalid_token",
            AccessDenied::Forbidden => "forbidden",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AccessDenied::Unauthenticated | AccessDenied::InvalidToken => StatusCode::UNAUTHORIZED,
            AccessDenied::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.reason_code(),
                "message": self.to_string()
            }
        }));

        let mut response = (self.status(), body).into_response();
        if self.status() == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// 접근 판단 결과. `Ok(())`면 허용.
pub type AuthorizationDecision = Result<(), AccessDenied>;

/// 접근 제어 게이트.
///
/// 검증기와 디렉터리는 프로세스 전역 공유 자원이며 읽기 전용으로만 사용합니다.
pub struct AccessGate {
    verifier: Arc<dyn IdentityVerifier>,
    directory: Arc<dyn UserDirectory>,
    routes: RouteTable,
    exempt_paths: HashSet<String>,
}

impl AccessGate {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        directory: Arc<dyn UserDirectory>,
        routes: RouteTable,
    ) -> Self {
        Self {
            verifier,
            directory,
            routes,
            exempt_paths: DEFAULT_EXEMPT_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// 예외 경로 목록 교체.
    pub fn with_exempt_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.exempt_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// 요청 인증 게이트.
    ///
    /// 공개 라우트 > OPTIONS > 예외 경로 순으로 통과시키고,
    /// 그 외에는 베어러 토큰을 검증해 신원을 `parts.extensions`에 첨부합니다.
    pub async fn authenticate(
        &self,
        policy: &RoutePolicy,
        parts: &mut Parts,
    ) -> AuthorizationDecision {
        if policy.is_public() {
            return Ok(());
        }

        if parts.method == Method::OPTIONS {
            return Ok(());
        }

        let path = original_path(parts);
        if self.exempt_paths.contains(&path) {
            return Ok(());
        }

        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) if !value.is_empty() => value,
            _ => {
                debug!(path = %path, "Missing authorization header");
                return Err(AccessDenied::Unauthenticated);
            }
        };

        let Ok(header) = header.to_str() else {
            warn!(path = %path, "Authorization header is not valid ASCII");
            return Err(AccessDenied::InvalidToken);
        };
        let token = header.strip_prefix(BEARER_PREFIX).unwrap_or(header);

        match self.verifier.verify(token).await {
            Ok(identity) => {
                debug!(path = %path, subject = %identity.subject_id, "Identity verified");
                parts.extensions.insert(identity);
                Ok(())
            }
            Err(err) if err.is_transient() => {
                error!(path = %path, error = %err, "Identity provider unavailable");
                Err(AccessDenied::InvalidToken)
            }
            Err(err) => {
                warn!(path = %path, error = %err, "Identity token rejected");
                Err(AccessDenied::InvalidToken)
            }
        }
    }

    /// 역할 인가 게이트.
    ///
    /// 인증 게이트가 첨부한 신원만 사용하며 원본 토큰은 다시 해석하지 않습니다.
    /// 조회 실패나 레코드 이상은 모두 거부입니다.
    pub async fn authorize(&self, required_role: &str, parts: &Parts) -> AuthorizationDecision {
        let Some(identity) = parts.extensions.get::<VerifiedIdentity>() else {
            warn!(role = required_role, "Role check without verified identity");
            return Err(AccessDenied::Forbidden);
        };
        let subject = identity.subject_id.as_str();

        let records = match self.directory.find_by_external_id(subject).await {
            Ok(records) => records,
            Err(e) if e.is_transient() => {
                error!(subject, role = required_role, error = %e, "User directory lookup failed");
                return Err(AccessDenied::Forbidden);
            }
            Err(e) => {
                warn!(subject, role = required_role, error = %e, "User directory lookup rejected");
                return Err(AccessDenied::Forbidden);
            }
        };

        match records.as_slice() {
            [] => {
                info!(subject, role = required_role, "No directory record for subject");
                Err(AccessDenied::Forbidden)
            }
            [user] if user.has_role(required_role) => Ok(()),
            [_] => {
                info!(subject, role = required_role, "Subject lacks required role");
                Err(AccessDenied::Forbidden)
            }
            duplicates => {
                error!(
                    subject,
                    count = duplicates.len(),
                    "Duplicate directory records for subject, manual repair required"
                );
                Err(AccessDenied::Forbidden)
            }
        }
    }

    /// 매칭된 라우트의 정책을 조회해 두 게이트를 순서대로 실행합니다.
    pub async fn check(&self, parts: &mut Parts) -> AuthorizationDecision {
        let template = parts
            .extensions
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_owned())
            .unwrap_or_else(|| parts.uri.path().to_owned());
        let policy = self.routes.resolve(&parts.method, &template);

        self.authenticate(&policy, parts).await?;

        if parts.method == Method::OPTIONS {
            return Ok(());
        }
        match policy.required_role() {
            Some(role) => self.authorize(role, parts).await,
            None => Ok(()),
        }
    }
}

/// 수신한 그대로의 요청 경로 (쿼리 문자열 포함).
fn original_path(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);

    uri.path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| uri.path().to_owned())
}

/// 접근 제어 미들웨어.
///
/// `route_layer`로 적용해야 `MatchedPath`를 사용할 수 있습니다.
pub async fn enforce_access(
    State(gate): State<Arc<AccessGate>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    match gate.check(&mut parts).await {
        Ok(()) => {
            record_access_decision("allowed");
            next.run(Request::from_parts(parts, body)).await
        }
        Err(denied) => {
            info!(
                method = %parts.method,
                path = %parts.uri.path(),
                reason = denied.reason_code(),
                "Access denied"
            );
            record_access_decision(denied.reason_code());
            denied.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::VerifyError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use taskboard_core::{InMemoryStore, Role, UserRecord};

    /// "good" 토큰만 통과시키는 검증기.
    struct FixedVerifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IdentityVerifier for FixedVerifier {
        async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match token {
                "good" => Ok(VerifiedIdentity::new("uid-1", "one@example.com")),
                "down" => Err(VerifyError::unavailable("connect timeout")),
                _ => Err(VerifyError::rejected("bad signature")),
            }
        }
    }

    fn gate_with(directory: Arc<InMemoryStore>) -> (AccessGate, Arc<FixedVerifier>) {
        let verifier = Arc::new(FixedVerifier {
            calls: AtomicUsize::new(0),
        });
        let gate = AccessGate::new(verifier.clone(), directory, RouteTable::new());
        (gate, verifier)
    }

    fn parts(method: Method, uri: &str, auth: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_public_route_skips_everything() {
        let (gate, verifier) = gate_with(Arc::new(InMemoryStore::new()));
        let mut p = parts(Method::GET, "/anything", Some("Bearer junk"));

        assert_eq!(gate.authenticate(&RoutePolicy::public(), &mut p).await, Ok(()));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
        assert!(p.extensions.get::<VerifiedIdentity>().is_none());
    }

    #[tokio::test]
    async fn test_options_allowed_without_header() {
        let (gate, _) = gate_with(Arc::new(InMemoryStore::new()));
        let mut p = parts(Method::OPTIONS, "/tasks", None);
        assert_eq!(
            gate.authenticate(&RoutePolicy::authenticated(), &mut p).await,
            Ok(())
        );
    }

    #[tokio::test]
    async fn test_exempt_path_exact_match_only() {
        let (gate, _) = gate_with(Arc::new(InMemoryStore::new()));
        let policy = RoutePolicy::authenticated();

        let mut exact = parts(Method::GET, "/health/status", None);
        assert_eq!(gate.authenticate(&policy, &mut exact).await, Ok(()));

        for uri in ["/health/status/", "/Health/status", "/health/status?verbose=1"] {
            let mut p = parts(Method::GET, uri, None);
            assert_eq!(
                gate.authenticate(&policy, &mut p).await,
                Err(AccessDenied::Unauthenticated),
                "{uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_or_empty_header_is_unauthenticated() {
        let (gate, verifier) = gate_with(Arc::new(InMemoryStore::new()));
        let policy = RoutePolicy::authenticated();

        let mut absent = parts(Method::GET, "/tasks", None);
        assert_eq!(
            gate.authenticate(&policy, &mut absent).await,
            Err(AccessDenied::Unauthenticated)
        );
        let mut empty = parts(Method::GET, "/tasks", Some(""));
        assert_eq!(
            gate.authenticate(&policy, &mut empty).await,
            Err(AccessDenied::Unauthenticated)
        );
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_token_verification_outcomes() {
        let (gate, _) = gate_with(Arc::new(InMemoryStore::new()));
        let policy = RoutePolicy::authenticated();

        let mut ok = parts(Method::GET, "/tasks", Some("Bearer good"));
        assert_eq!(gate.authenticate(&policy, &mut ok).await, Ok(()));
        assert_eq!(
            ok.extensions.get::<VerifiedIdentity>().map(|i| i.subject_id.as_str()),
            Some("uid-1")
        );

        // 접두사 없는 토큰도 그대로 검증
        let mut raw = parts(Method::GET, "/tasks", Some("good"));
        assert_eq!(gate.authenticate(&policy, &mut raw).await, Ok(()));

        for value in ["Bearer forged", "Bearer down", "Bearer "] {
            let mut p = parts(Method::GET, "/tasks", Some(value));
            assert_eq!(
                gate.authenticate(&policy, &mut p).await,
                Err(AccessDenied::InvalidToken),
                "{value}"
            );
            assert!(p.extensions.get::<VerifiedIdentity>().is_none());
        }
    }

    #[tokio::test]
    async fn test_authorize_role_lookup() {
        let store = Arc::new(InMemoryStore::new());
        let (gate, _) = gate_with(store.clone());
        let identity = VerifiedIdentity::new("uid-1", "one@example.com");

        let mut p = parts(Method::GET, "/user/all", None);
        // 신원 없음
        assert_eq!(gate.authorize("admin", &p).await, Err(AccessDenied::Forbidden));

        p.extensions.insert(identity.clone());
        // 디렉터리 레코드 없음
        assert_eq!(gate.authorize("admin", &p).await, Err(AccessDenied::Forbidden));

        store
            .insert_user(UserRecord::from_identity(&identity, vec![Role::new("user")]))
            .await;
        assert_eq!(gate.authorize("admin", &p).await, Err(AccessDenied::Forbidden));
        assert_eq!(gate.authorize("user", &p).await, Ok(()));
    }

    #[tokio::test]
    async fn test_authorize_single_admin_allowed_duplicates_denied() {
        let store = Arc::new(InMemoryStore::new());
        let (gate, _) = gate_with(store.clone());
        let identity = VerifiedIdentity::new("uid-1", "one@example.com");
        let mut p = parts(Method::GET, "/user/all", None);
        p.extensions.insert(identity.clone());

        store
            .insert_user(UserRecord::from_identity(&identity, vec![Role::new("admin")]))
            .await;
        assert_eq!(gate.authorize("admin", &p).await, Ok(()));

        store
            .insert_user(UserRecord::from_identity(&identity, vec![Role::new("admin")]))
            .await;
        assert_eq!(gate.authorize("admin", &p).await, Err(AccessDenied::Forbidden));
    }

    #[test]
    fn test_denial_responses() {
        for (denied, status) in [
            (AccessDenied::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AccessDenied::InvalidToken, StatusCode::UNAUTHORIZED),
            (AccessDenied::Forbidden, StatusCode::FORBIDDEN),
        ] {
            let response = denied.into_response();
            assert_eq!(response.status(), status);
            assert_eq!(
                response.headers().contains_key(WWW_AUTHENTICATE),
                status == StatusCode::UNAUTHORIZED
            );
        }
    }
}
