//! Firebase ID 토큰 검증.
//!
//! Google이 공개하는 JWK 세트로 RS256 서명을 확인하고
//! `aud`, `iss`, `exp`, `sub` 클레임을 검증합니다.
//! 서명 키만 캐시하며 검증 결과는 캐시하지 않습니다.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{
    decode, decode_header,
    jwk::{Jwk, JwkSet},
    Algorithm, DecodingKey, Validation,
};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use taskboard_core::VerifiedIdentity;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::{IdentityVerifier, VerifyError};

/// Firebase ID 토큰 서명 키 (JWK 세트) 엔드포인트.
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// `Cache-Control: max-age`가 없을 때의 키 캐시 수명.
const DEFAULT_KEY_TTL: Duration = Duration::from_secs(3600);

/// 알 수 없는 kid로 인한 키 재조회 최소 간격.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// 서비스 계정 자격증명 (`FIREBASE_ADMIN_KEY` JSON).
///
/// 토큰 검증에는 `project_id`만 사용합니다.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    #[serde(default)]
    pub client_email: Option<String>,
}

impl ServiceAccountKey {
    /// 자격증명 JSON 파싱.
    pub fn from_json(blob: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(blob)
    }
}

/// Firebase ID 토큰 페이로드 중 사용하는 클레임.
#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    #[serde(default)]
    sub: String,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl FirebaseClaims {
    fn into_identity(self) -> Result<VerifiedIdentity, VerifyError> {
        let subject_id = if self.sub.is_empty() {
            self.user_id.unwrap_or_default()
        } else {
            self.sub
        };
        if subject_id.is_empty() {
            return Err(VerifyError::rejected("missing subject"));
        }

        Ok(VerifiedIdentity {
            subject_id,
            email: self.email.unwrap_or_default(),
            display_name: self.name,
            avatar_url: self.picture,
        })
    }
}

#[derive(Debug)]
struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
    ttl: Duration,
}

impl CachedKeys {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }
}

/// Firebase ID 토큰 검증기.
pub struct FirebaseVerifier {
    project_id: String,
    issuer: String,
    jwks_url: String,
    http: reqwest::Client,
    keys: RwLock<Option<CachedKeys>>,
    /// 키 재조회는 한 번에 하나만 수행합니다.
    refresh_lock: Mutex<()>,
}

impl std::fmt::Debug for FirebaseVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseVerifier")
            .field("project_id", &self.project_id)
            .field("jwks_url", &self.jwks_url)
            .finish()
    }
}

impl FirebaseVerifier {
    /// 서비스 계정 자격증명으로 검증기를 생성합니다.
    pub fn new(account: &ServiceAccountKey) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            project_id: account.project_id.clone(),
            issuer: format!("{}{}", FIREBASE_ISSUER_PREFIX, account.project_id),
            jwks_url: FIREBASE_JWKS_URL.to_string(),
            http,
            keys: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// 키 엔드포인트 변경 (에뮬레이터, 테스트용).
    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);
        validation.validate_exp = true;
        validation
    }

    /// kid에 해당하는 서명 키 조회.
    ///
    /// 캐시가 만료되었거나 kid를 모르면 한 번 재조회합니다.
    /// 최근 재조회 직후의 모르는 kid는 재조회 없이 거부합니다.
    /// 재조회가 실패하면 만료된 캐시의 키라도 사용합니다.
    async fn signing_key(&self, kid: &str) -> Result<DecodingKey, VerifyError> {
        if let Some(found) = self.cached_key(kid).await {
            return found;
        }

        let _refreshing = self.refresh_lock.lock().await;
        // 대기하는 동안 다른 요청이 이미 갱신했을 수 있음
        if let Some(found) = self.cached_key(kid).await {
            return found;
        }

        match self.refresh_keys().await {
            Ok(keys) => {
                let jwk = keys
                    .find(kid)
                    .ok_or_else(|| VerifyError::rejected("unknown signing key id"))?;
                decoding_key(jwk)
            }
            Err(err) => {
                let cache = self.keys.read().await;
                match cache.as_ref().and_then(|cached| cached.keys.find(kid)) {
                    Some(jwk) => {
                        warn!(error = %err, kid, "Key refresh failed, using stale signing key");
                        decoding_key(jwk)
                    }
                    None => Err(err),
                }
            }
        }
    }

    /// 신선한 캐시로 결정할 수 있으면 결과를, 재조회가 필요하면 `None`을 반환합니다.
    async fn cached_key(&self, kid: &str) -> Option<Result<DecodingKey, VerifyError>> {
        let cache = self.keys.read().await;
        let cached = cache.as_ref().filter(|c| c.is_fresh())?;
        if let Some(jwk) = cached.keys.find(kid) {
            return Some(decoding_key(jwk));
        }
        if cached.fetched_at.elapsed() < MIN_REFRESH_INTERVAL {
            return Some(Err(VerifyError::rejected("unknown signing key id")));
        }
        None
    }

    async fn refresh_keys(&self) -> Result<JwkSet, VerifyError> {
        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(VerifyError::unavailable)?
            .error_for_status()
            .map_err(VerifyError::unavailable)?;

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_KEY_TTL);

        let keys: JwkSet = response.json().await.map_err(VerifyError::unavailable)?;

        debug!(
            key_count = keys.keys.len(),
            ttl_secs = ttl.as_secs(),
            "Refreshed identity provider signing keys"
        );

        *self.keys.write().await = Some(CachedKeys {
            keys: keys.clone(),
            fetched_at: Instant::now(),
            ttl,
        });

        Ok(keys)
    }
}

fn decoding_key(jwk: &Jwk) -> Result<DecodingKey, VerifyError> {
    DecodingKey::from_jwk(jwk)
        .map_err(|e| VerifyError::unavailable(format!("unusable signing key: {}", e)))
}

/// `Cache-Control` 헤더에서 `max-age` 추출.
fn parse_max_age(value: &str) -> Option<Duration> {
    value
        .split(',')
        .map(str::trim)
        .find_map(|directive| directive.strip_prefix("max-age="))
        .and_then(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        if token.is_empty() {
            return Err(VerifyError::rejected("empty token"));
        }

        let header = decode_header(token)
            .map_err(|e| VerifyError::rejected(format!("malformed token: {}", e)))?;
        if header.alg != Algorithm::RS256 {
            return Err(VerifyError::rejected(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| VerifyError::rejected("missing key id"))?;

        let key = self.signing_key(&kid).await?;
        let data = decode::<FirebaseClaims>(token, &key, &self.validation())
            .map_err(|e| VerifyError::rejected(e.to_string()))?;

        data.claims.into_identity()
    }
}
