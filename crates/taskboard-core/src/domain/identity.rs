//! 외부 ID 공급자가 검증한 신원.

use serde::{Deserialize, Serialize};

/// 요청 단위로 검증된 신원.
///
/// ID 공급자의 토큰 검증이 성공했을 때만 생성되며 저장되지 않습니다.
/// 요청 컨텍스트에 첨부되어 해당 요청이 끝나면 폐기됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct VerifiedIdentity {
    /// ID 공급자가 발급한 subject id
    pub subject_id: String,
    /// 이메일 (공급자가 제공하지 않으면 빈 문자열)
    pub email: String,
    /// 표시 이름
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// 프로필 이미지 URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl VerifiedIdentity {
    pub fn new(subject_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: email.into(),
            display_name: None,
            avatar_url: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}
