//! 인증 및 권한 부여.
//!
//! 외부 ID 공급자 토큰 기반 인증과 역할 기반 접근 제어를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`IdentityVerifier`]: 베어러 토큰 → [`VerifiedIdentity`] 검증 계약
//! - [`FirebaseVerifier`]: Firebase ID 토큰 검증 구현체
//! - [`RoutePolicy`] / [`RouteTable`]: 라우트별 공개/역할 설정
//! - [`AccessGate`]: 요청 인증 게이트 + 역할 인가 게이트
//! - [`Authenticated`], [`CurrentUser`]: 핸들러용 추출기
//!
//! # 요청 흐름
//!
//! 1. `enforce_access` 미들웨어가 매칭된 라우트의 정책을 조회
//! 2. 공개 라우트 / OPTIONS / 예외 경로면 통과
//! 3. 아니면 토큰을 검증하고 신원을 요청 extensions에 첨부
//! 4. 역할이 필요한 라우트는 첨부된 신원으로 디렉터리를 조회해 역할 확인
//!
//! ```rust,ignore
//! async fn profile(Authenticated(identity): Authenticated) -> impl IntoResponse {
//!     format!("Hello, {}!", identity.subject_id)
//! }
//! ```

mod extractor;
mod firebase;
mod gate;
mod identity;
mod policy;

pub use extractor::{Authenticated, CurrentUser};
pub use firebase::{FirebaseVerifier, ServiceAccountKey, FIREBASE_JWKS_URL};
pub use gate::{enforce_access, AccessDenied, AccessGate, AuthorizationDecision, DEFAULT_EXEMPT_PATHS};
pub use identity::{IdentityVerifier, VerifyError};
pub use policy::{PolicyRouter, RoutePolicy, RouteTable};

pub use taskboard_core::VerifiedIdentity;
