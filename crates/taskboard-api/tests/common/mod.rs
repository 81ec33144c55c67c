//! 통합 테스트 공용 헬퍼.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::AUTHORIZATION, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use taskboard_api::auth::{IdentityVerifier, VerifyError, DEFAULT_EXEMPT_PATHS};
use taskboard_api::{create_app, AppState};
use taskboard_core::{InMemoryStore, Role, Stores, UserRecord, VerifiedIdentity};
use tower::ServiceExt;

/// 토큰 → 신원 고정 매핑 검증기. 호출 횟수를 기록합니다.
#[derive(Default)]
pub struct StaticVerifier {
    identities: HashMap<String, VerifiedIdentity>,
    calls: AtomicUsize,
}

/// 이 토큰은 공급자 장애로 취급합니다.
pub const UNAVAILABLE_TOKEN: &str = "provider-down";

impl StaticVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(mut self, token: &str, identity: VerifiedIdentity) -> Self {
        self.identities.insert(token.to_string(), identity);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if token == UNAVAILABLE_TOKEN {
            return Err(VerifyError::unavailable("connection refused"));
        }
        self.identities
            .get(token)
            .cloned()
            .ok_or_else(|| VerifyError::rejected("signature mismatch"))
    }
}

pub fn alice() -> VerifiedIdentity {
    VerifiedIdentity::new("uid-alice", "alice@example.com").with_display_name("Alice")
}

pub fn bob() -> VerifiedIdentity {
    VerifiedIdentity::new("uid-bob", "bob@example.com")
}

pub fn root() -> VerifiedIdentity {
    VerifiedIdentity::new("uid-root", "root@example.com")
}

/// 테스트 환경: 인메모리 저장소 + 고정 검증기 + 전체 라우터.
pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub verifier: Arc<StaticVerifier>,
    pub router: Router,
}

impl TestApp {
    /// alice/bob/root 토큰을 아는 검증기로 구성합니다. 디렉터리 레코드는 비어 있습니다.
    pub fn new() -> Self {
        let verifier = StaticVerifier::new()
            .with_identity("alice-token", alice())
            .with_identity("bob-token", bob())
            .with_identity("root-token", root());
        Self::with_verifier(verifier)
    }

    pub fn with_verifier(verifier: StaticVerifier) -> Self {
        let store = Arc::new(InMemoryStore::with_default_roles());
        let verifier = Arc::new(verifier);
        let state = Arc::new(AppState::new(Stores::from_backend(store.clone())));
        let router = create_app(state, verifier.clone(), DEFAULT_EXEMPT_PATHS.iter().copied());

        Self {
            store,
            verifier,
            router,
        }
    }

    /// 지정한 역할로 디렉터리 레코드를 직접 삽입합니다.
    pub async fn seed_user(&self, identity: &VerifiedIdentity, roles: &[&str]) -> UserRecord {
        let roles = roles.iter().map(|name| Role::new(*name)).collect();
        let user = UserRecord::from_identity(identity, roles);
        self.store.insert_user(user.clone()).await;
        user
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        self.send_raw(method, uri, authorization, body.map(|json| json.to_string()))
            .await
    }

    /// 본문 문자열을 그대로 `application/json`으로 보냅니다.
    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<String>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let request = match body {
            Some(raw) => builder
                .header("content-type", "application/json")
                .body(Body::from(raw))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// 베어러 토큰으로 요청합니다.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        body: Option<Value>,
    ) -> TestResponse {
        let authorization = bearer(token);
        self.send(method, uri, Some(authorization.as_str()), body)
            .await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, token.map(bearer).as_deref(), None)
            .await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn error_code(&self) -> Option<&str> {
        self.body["error"]["code"].as_str()
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
