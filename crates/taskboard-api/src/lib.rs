//! # Taskboard API
//!
//! 사용자별 태스크 관리 REST API 서버 라이브러리.
//!
//! - [`auth`]: ID 공급자 토큰 검증, 라우트 정책, 접근 게이트
//! - [`routes`]: 헬스 체크, 사용자, 역할, 태스크 엔드포인트
//! - [`repository`]: PostgreSQL 저장소
//! - [`config`]: 환경 변수 설정

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use error::{ApiErrorResponse, ApiResult};
pub use routes::{api_routes, create_app};
pub use state::AppState;
