//! # Taskboard Core
//!
//! 태스크 백엔드의 핵심 도메인 모델 및 저장소 계약을 제공합니다.
//!
//! 이 크레이트는 API 서버 전반에서 사용되는 기본 타입을 제공합니다:
//! - 검증된 신원 (`VerifiedIdentity`)
//! - 사용자 레코드 및 역할
//! - 태스크 및 입력 타입
//! - 사용자 디렉터리 / 태스크 저장소 trait
//! - 테스트 및 DB 없는 실행을 위한 인메모리 저장소
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;
pub mod store;

pub use domain::*;
pub use error::*;
pub use logging::*;
pub use store::*;
