//! 접근 게이트 통합 테스트.
//!
//! 전체 라우터를 `oneshot`으로 구동해 인증/인가 동작을 확인합니다.

mod common;

use std::sync::Arc;

use axum::http::{header::WWW_AUTHENTICATE, Method, Request, StatusCode};
use common::{alice, bearer, root, StaticVerifier, TestApp, UNAVAILABLE_TOKEN};
use proptest::prelude::*;
use taskboard_api::api_routes;
use taskboard_api::auth::{AccessDenied, AccessGate, RoutePolicy};
use taskboard_core::{InMemoryStore, VerifiedIdentity};

// ============================================================================
// 공개 라우트 / OPTIONS / 예외 경로
// ============================================================================

#[tokio::test]
async fn public_route_ignores_authorization_header() {
    let app = TestApp::new();

    for header in [None, Some(""), Some("garbage"), Some("Bearer forged")] {
        let response = app
            .send(Method::GET, "/health/ready", header, None)
            .await;
        assert_eq!(response.status, StatusCode::OK, "header {header:?}");
    }
    let openapi = app.get("/api-docs/openapi.json", None).await;
    assert_eq!(openapi.status, StatusCode::OK);

    assert_eq!(app.verifier.calls(), 0);
}

#[tokio::test]
async fn head_follows_get_policy() {
    let app = TestApp::new();
    let response = app.send(Method::HEAD, "/health/ready", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn options_is_never_denied_by_gate() {
    let app = TestApp::new();

    for uri in ["/tasks", "/user/all", "/user-role"] {
        let response = app.send(Method::OPTIONS, uri, None, None).await;
        assert_ne!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_ne!(response.status, StatusCode::FORBIDDEN, "{uri}");
    }
    assert_eq!(app.verifier.calls(), 0);
}

#[tokio::test]
async fn exempt_path_exact_match() {
    let app = TestApp::new();

    let exact = app.get("/health/status", None).await;
    assert_eq!(exact.status, StatusCode::OK);
    assert_eq!(exact.body["status"], "ok");

    // 쿼리 문자열이 붙으면 예외 경로가 아님
    let with_query = app.get("/health/status?verbose=1", None).await;
    assert_eq!(with_query.status, StatusCode::UNAUTHORIZED);
    assert_eq!(with_query.error_code(), Some("unauthenticated"));

    // 유효한 자격증명이면 통과
    let authed = app.get("/health/status?verbose=1", Some("alice-token")).await;
    assert_eq!(authed.status, StatusCode::OK);
}

#[tokio::test]
async fn custom_exempt_list_replaces_default() {
    let store = Arc::new(InMemoryStore::with_default_roles());
    let (_, table) = api_routes().into_parts();
    let gate = AccessGate::new(Arc::new(StaticVerifier::new()), store, table)
        .with_exempt_paths(["/tasks"]);

    let mut status = parts(Method::GET, "/health/status", None);
    assert_eq!(
        gate.check(&mut status).await,
        Err(AccessDenied::Unauthenticated)
    );

    let mut tasks = parts(Method::GET, "/tasks", None);
    assert_eq!(gate.check(&mut tasks).await, Ok(()));
}

// ============================================================================
// 토큰 검증
// ============================================================================

#[tokio::test]
async fn missing_or_empty_header_is_unauthenticated() {
    let app = TestApp::new();

    for header in [None, Some("")] {
        let response = app.send(Method::GET, "/tasks", header, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.error_code(), Some("unauthenticated"));
        assert_eq!(
            response.headers.get(WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
    assert_eq!(app.verifier.calls(), 0);
}

#[tokio::test]
async fn unverifiable_token_is_invalid_token() {
    let app = TestApp::new();
    app.seed_user(&alice(), &["user"]).await;

    let unavailable = bearer(UNAVAILABLE_TOKEN);
    for header in ["Bearer forged", "forged", "Bearer ", unavailable.as_str()] {
        let response = app.send(Method::GET, "/tasks", Some(header), None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{header}");
        assert_eq!(response.error_code(), Some("invalid_token"));
        assert_eq!(response.body["error"]["message"], "Unauthorized");
    }
}

#[tokio::test]
async fn valid_token_without_prefix_is_accepted() {
    let app = TestApp::new();
    app.seed_user(&alice(), &["user"]).await;

    let response = app.send(Method::GET, "/user", Some("alice-token"), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["external_id"], "uid-alice");
}

#[tokio::test]
async fn each_request_verifies_independently() {
    let app = TestApp::new();
    app.seed_user(&alice(), &["user"]).await;

    let first = app.get("/tasks", Some("alice-token")).await;
    let second = app.get("/tasks", Some("alice-token")).await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(app.verifier.calls(), 2);
}

#[tokio::test]
async fn role_route_verifies_once() {
    let app = TestApp::new();
    app.seed_user(&root(), &["admin"]).await;

    let response = app.get("/user/all", Some("root-token")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.verifier.calls(), 1);
}

// ============================================================================
// 역할 인가
// ============================================================================

#[tokio::test]
async fn admin_route_requires_admin_role() {
    let app = TestApp::new();
    app.seed_user(&alice(), &["user"]).await;
    app.seed_user(&root(), &["user", "admin"]).await;

    let denied = app.get("/user/all", Some("alice-token")).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.error_code(), Some("forbidden"));
    assert!(denied.headers.get(WWW_AUTHENTICATE).is_none());

    let allowed = app.get("/user/all", Some("root-token")).await;
    assert_eq!(allowed.status, StatusCode::OK);
    assert_eq!(allowed.body["total"], 2);
}

#[tokio::test]
async fn admin_route_without_directory_record_is_forbidden() {
    let app = TestApp::new();

    let response = app.get("/user-role", Some("root-token")).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn duplicate_directory_records_are_forbidden() {
    let app = TestApp::new();
    app.seed_user(&root(), &["admin"]).await;
    app.seed_user(&root(), &["admin"]).await;

    let response = app.get("/user/all", Some("root-token")).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn role_name_match_is_exact() {
    let app = TestApp::new();
    app.seed_user(&root(), &["Admin", "administrator"]).await;

    let response = app.get("/user/all", Some("root-token")).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

// ============================================================================
// 정책 테이블
// ============================================================================

#[test]
fn every_registered_route_has_expected_policy() {
    let (_, table) = api_routes().into_parts();

    let public = [
        (Method::GET, "/health/ready"),
        (Method::GET, "/metrics"),
        (Method::GET, "/api-docs/openapi.json"),
    ];
    for (method, path) in &public {
        assert_eq!(table.resolve(method, path), RoutePolicy::public(), "{path}");
    }

    let admin = [
        (Method::GET, "/user/all"),
        (Method::GET, "/user-role"),
        (Method::POST, "/user-role"),
    ];
    for (method, path) in &admin {
        assert_eq!(table.resolve(method, path), RoutePolicy::role("admin"), "{path}");
    }

    for (method, path, policy) in table.iter() {
        let expected_public = public.iter().any(|(m, p)| m == method && *p == path);
        assert_eq!(policy.is_public(), expected_public, "{method} {path}");
    }
    assert_eq!(table.len(), 16);
}

// ============================================================================
// 속성 테스트 (게이트 단위)
// ============================================================================

fn parts(method: Method, uri: &str, authorization: Option<&str>) -> axum::http::request::Parts {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    builder.body(()).unwrap().into_parts().0
}

fn gate_with_alice() -> AccessGate {
    let verifier = StaticVerifier::new().with_identity("alice-token", alice());
    let (_, table) = api_routes().into_parts();
    AccessGate::new(
        Arc::new(verifier),
        Arc::new(InMemoryStore::with_default_roles()),
        table,
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn public_route_allows_any_header(header in "[ -~]{0,64}") {
        let gate = gate_with_alice();
        let mut p = parts(Method::GET, "/health/ready", Some(header.as_str()));

        let decision = runtime().block_on(gate.check(&mut p));
        prop_assert_eq!(decision, Ok(()));
        prop_assert!(p.extensions.get::<VerifiedIdentity>().is_none());
    }

    #[test]
    fn options_allows_any_route_and_header(
        path in "/[a-z]{1,10}(/[a-z0-9]{1,8}){0,2}",
        header in proptest::option::of("[ -~]{0,64}"),
    ) {
        let gate = gate_with_alice();
        let mut p = parts(Method::OPTIONS, &path, header.as_deref());

        prop_assert_eq!(runtime().block_on(gate.check(&mut p)), Ok(()));
    }

    #[test]
    fn unknown_token_never_attaches_identity(token in "[A-Za-z0-9._-]{1,64}") {
        prop_assume!(token != "alice-token");
        let gate = gate_with_alice();
        let header = format!("Bearer {token}");
        let mut p = parts(Method::GET, "/tasks", Some(header.as_str()));

        let decision = runtime().block_on(gate.check(&mut p));
        prop_assert_eq!(decision, Err(AccessDenied::InvalidToken));
        prop_assert!(p.extensions.get::<VerifiedIdentity>().is_none());
    }

    #[test]
    fn exempt_path_variants_are_not_exempt(suffix in "(/|\\?[a-z]{1,5}=[a-z0-9]{1,5}|/x)") {
        let gate = gate_with_alice();
        let uri = format!("/health/status{suffix}");
        let mut p = parts(Method::GET, &uri, None);

        prop_assert_eq!(
            runtime().block_on(gate.check(&mut p)),
            Err(AccessDenied::Unauthenticated)
        );
    }
}
