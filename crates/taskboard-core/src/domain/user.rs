//! 사용자 레코드 및 역할.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::VerifiedIdentity;

/// 신규 가입자에게 부여되는 기본 역할 이름.
pub const DEFAULT_USER_ROLE: &str = "user";

/// 관리자 엔드포인트에 필요한 역할 이름.
pub const ADMIN_ROLE: &str = "admin";

/// 사용자 역할.
///
/// 사용자 디렉터리에 속하며 권한 판단 시에는 이름으로만 참조됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct Role {
    pub id: Uuid,
    pub name: String,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// 내부 사용자 레코드.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct UserRecord {
    pub id: Uuid,
    /// ID 공급자의 subject id
    pub external_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    /// 소속 역할 목록
    pub roles: Vec<Role>,
    /// 클라이언트 측 암호화용 솔트
    pub salt: Option<String>,
    /// 첫 로그인 완료 전이면 true
    pub first_login: bool,
    /// 푸시 알림용 디바이스 토큰
    pub device_tokens: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// 검증된 신원으로부터 새 사용자 레코드를 만듭니다.
    ///
    /// 솔트는 새로 생성되고 `first_login`은 true로 시작합니다.
    pub fn from_identity(identity: &VerifiedIdentity, roles: Vec<Role>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            external_id: identity.subject_id.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            avatar_url: identity.avatar_url.clone(),
            roles,
            salt: Some(Uuid::new_v4().to_string()),
            first_login: true,
            device_tokens: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 이름이 정확히 일치하는 역할이 있는지 확인.
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role.name == name)
    }

    /// 수정 시각 갱신.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
