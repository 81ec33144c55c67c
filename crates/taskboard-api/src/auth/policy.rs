//! 라우트별 접근 정책.
//!
//! 라우트 등록 시점에 (메서드, 라우트 템플릿) → 정책 매핑을 함께 기록합니다.
//! 게이트는 요청의 `MatchedPath`로 이 테이블을 조회합니다.

use std::collections::HashMap;

use axum::{
    handler::Handler,
    http::Method,
    routing::{on, MethodFilter},
    Router,
};

/// 라우트 접근 정책.
///
/// 생성자로만 만들 수 있어 "공개이면서 역할 필요" 같은 조합은 표현되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    public: bool,
    required_role: Option<String>,
}

impl RoutePolicy {
    /// 인증 없이 접근 가능.
    pub fn public() -> Self {
        Self {
            public: true,
            required_role: None,
        }
    }

    /// 검증된 신원 필요.
    pub fn authenticated() -> Self {
        Self {
            public: false,
            required_role: None,
        }
    }

    /// 검증된 신원 + 역할 필요.
    pub fn role(name: impl Into<String>) -> Self {
        Self {
            public: false,
            required_role: Some(name.into()),
        }
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn required_role(&self) -> Option<&str> {
        self.required_role.as_deref()
    }
}

/// (메서드, 라우트 템플릿) → 정책 테이블.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: HashMap<(Method, String), RoutePolicy>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 정책 등록. 같은 키가 있으면 이전 정책을 반환합니다.
    pub fn insert(
        &mut self,
        method: Method,
        template: impl Into<String>,
        policy: RoutePolicy,
    ) -> Option<RoutePolicy> {
        self.entries.insert((method, template.into()), policy)
    }

    pub fn get(&self, method: &Method, template: &str) -> Option<&RoutePolicy> {
        self.entries.get(&(method.clone(), template.to_string()))
    }

    /// 요청에 적용할 정책.
    ///
    /// HEAD는 GET 정책을 따르고, 등록되지 않은 라우트는 인증 필요로 취급합니다.
    pub fn resolve(&self, method: &Method, template: &str) -> RoutePolicy {
        let method = if *method == Method::HEAD {
            Method::GET
        } else {
            method.clone()
        };

        self.get(&method, template)
            .cloned()
            .unwrap_or_else(RoutePolicy::authenticated)
    }

    pub fn merge(&mut self, other: RouteTable) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Method, &str, &RoutePolicy)> {
        self.entries
            .iter()
            .map(|((method, template), policy)| (method, template.as_str(), policy))
    }
}

/// 정책과 함께 라우트를 등록하는 라우터 빌더.
pub struct PolicyRouter<S> {
    router: Router<S>,
    table: RouteTable,
}

impl<S> Default for PolicyRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> PolicyRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            table: RouteTable::new(),
        }
    }

    pub fn get<H, T>(self, path: &str, handler: H, policy: RoutePolicy) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.on(Method::GET, MethodFilter::GET, path, handler, policy)
    }

    pub fn post<H, T>(self, path: &str, handler: H, policy: RoutePolicy) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.on(Method::POST, MethodFilter::POST, path, handler, policy)
    }

    pub fn put<H, T>(self, path: &str, handler: H, policy: RoutePolicy) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.on(Method::PUT, MethodFilter::PUT, path, handler, policy)
    }

    pub fn delete<H, T>(self, path: &str, handler: H, policy: RoutePolicy) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.on(Method::DELETE, MethodFilter::DELETE, path, handler, policy)
    }

    fn on<H, T>(
        mut self,
        method: Method,
        filter: MethodFilter,
        path: &str,
        handler: H,
        policy: RoutePolicy,
    ) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        if let Some(previous) = self.table.insert(method.clone(), path, policy) {
            tracing::warn!(%method, path, ?previous, "Route policy registered twice");
        }
        self.router = self.router.route(path, on(filter, handler));
        self
    }

    pub fn merge(mut self, other: PolicyRouter<S>) -> Self {
        self.router = self.router.merge(other.router);
        self.table.merge(other.table);
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn into_parts(self) -> (Router<S>, RouteTable) {
        (self.router, self.table)
    }
}
