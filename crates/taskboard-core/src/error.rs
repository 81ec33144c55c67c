//! 저장소 에러 타입.
//!
//! 사용자 디렉터리 및 태스크 저장소 구현체가 공통으로 반환하는 에러를 정의합니다.

use thiserror::Error;

/// 저장소 연산 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 대상 레코드 없음
    #[error("레코드를 찾을 수 없음")]
    NotFound,

    /// 유일성 제약 위반 (예: 중복 역할 이름)
    #[error("중복 레코드: {0}")]
    Conflict(String),

    /// 백엔드(DB 등) 에러
    #[error("저장소 백엔드 에러: {0}")]
    Backend(String),
}

/// 저장소 연산을 위한 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// 백엔드 에러 생성 헬퍼.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }

    /// 일시적인 장애인지 확인합니다.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Backend(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_transient() {
        assert!(StoreError::backend("connection reset").is_transient());
        assert!(!StoreError::NotFound.is_transient());
        assert!(!StoreError::Conflict("admin".to_string()).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::Conflict("role admin".to_string());
        assert!(err.to_string().contains("role admin"));
    }
}
