//! 환경 변수 기반 서버 설정.
//!
//! `.env` 파일은 `main`에서 `dotenvy`로 먼저 로드됩니다.
//!
//! | 변수 | 기본값 |
//! |---|---|
//! | `FIREBASE_ADMIN_KEY` | 필수 (서비스 계정 JSON) |
//! | `API_HOST` | `127.0.0.1` |
//! | `API_PORT` | `3000` |
//! | `DATABASE_URL` | 없음 (인메모리 저장소) |
//! | `AUTH_EXEMPT_PATHS` | `/health/status` |
//! | `CORS_ORIGINS` | 없음 (모든 origin 허용) |
//! | `REQUEST_TIMEOUT_SECS` | `30` |

use std::net::SocketAddr;
use std::time::Duration;

use crate::auth::{ServiceAccountKey, DEFAULT_EXEMPT_PATHS};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// 설정 로드 에러. 모두 시작 시 치명적입니다.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("필수 환경 변수가 없습니다: {0}")]
    Missing(&'static str),

    #[error("환경 변수 {name} 값이 유효하지 않습니다: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// 서버 설정.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// ID 공급자 서비스 계정 자격증명
    pub service_account: ServiceAccountKey,
    pub database_url: Option<String>,
    /// 인증 예외 경로 (정확히 일치해야 함)
    pub exempt_paths: Vec<String>,
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
}

impl AppConfig {
    /// 프로세스 환경 변수에서 설정 로드.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 임의의 조회 함수로 설정 로드.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let admin_key = get("FIREBASE_ADMIN_KEY").ok_or(ConfigError::Missing("FIREBASE_ADMIN_KEY"))?;
        let service_account =
            ServiceAccountKey::from_json(&admin_key).map_err(|e| ConfigError::Invalid {
                name: "FIREBASE_ADMIN_KEY",
                reason: e.to_string(),
            })?;

        let port = match get("API_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "API_PORT",
                reason: format!("not a port number: {raw}"),
            })?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "REQUEST_TIMEOUT_SECS",
                reason: format!("not a number of seconds: {raw}"),
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let exempt_paths = match get("AUTH_EXEMPT_PATHS") {
            Some(raw) => split_list(&raw),
            None => DEFAULT_EXEMPT_PATHS.iter().map(|p| p.to_string()).collect(),
        };

        Ok(Self {
            host: get("API_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            service_account,
            database_url: get("DATABASE_URL"),
            exempt_paths,
            cors_origins: get("CORS_ORIGINS").map(|raw| split_list(&raw)).unwrap_or_default(),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// 소켓 주소 반환.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: "API_HOST",
                reason: e.to_string(),
            })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
