//! ID 공급자 검증 계약.

use async_trait::async_trait;
use taskboard_core::VerifiedIdentity;

/// 토큰 검증 실패.
///
/// 두 경우 모두 호출자에게는 `invalid_token`으로 보이지만
/// 운영 진단을 위해 로그 레벨을 구분합니다.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// 형식 오류, 서명 불일치, 만료, aud/iss 불일치 등
    #[error("토큰 거부: {0}")]
    Rejected(String),
    /// 공급자 키 엔드포인트 접근 불가 또는 응답 이상
    #[error("ID 공급자 사용 불가: {0}")]
    Unavailable(String),
}

impl VerifyError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        VerifyError::Rejected(reason.into())
    }

    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        VerifyError::Unavailable(reason.to_string())
    }

    /// 네트워크/공급자 쪽 일시 장애인지 확인.
    pub fn is_transient(&self) -> bool {
        matches!(self, VerifyError::Unavailable(_))
    }
}

/// 베어러 토큰 검증기.
///
/// 프로세스 시작 시 한 번 생성되어 게이트에 주입되며
/// 여러 요청에서 동시에 호출됩니다.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// 토큰을 검증하고 신원을 반환합니다.
    ///
    /// 결과는 캐시되지 않으며 호출마다 새로 검증해야 합니다.
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError>;
}
