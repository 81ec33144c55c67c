//! Taskboard API 서버.
//!
//! 환경 변수로 설정을 읽고 접근 게이트가 적용된 Axum 서버를 시작합니다.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, middleware, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use taskboard_api::auth::FirebaseVerifier;
use taskboard_api::metrics::setup_metrics_recorder;
use taskboard_api::middleware::metrics_layer;
use taskboard_api::repository::PgStore;
use taskboard_api::{create_app, AppConfig, AppState};
use taskboard_core::{init_logging_from_env, Stores};

/// CORS 레이어 생성.
///
/// origin 목록이 비어 있으면 모든 origin을 허용합니다 (개발 모드).
fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<_> = origins.iter().filter_map(|s| s.parse().ok()).collect();

    let (allow_origin, credentials) = if parsed.is_empty() {
        if origins.is_empty() {
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
        } else {
            warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
        }
        (AllowOrigin::any(), false)
    } else {
        info!("CORS configured with {} allowed origins", parsed.len());
        (AllowOrigin::list(parsed), true)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(credentials)
        .max_age(Duration::from_secs(3600))
}

/// 공통 미들웨어 적용.
fn create_router(app: Router, config: &AppConfig) -> Router {
    app.layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(cors_layer(&config.cors_origins))
}

/// 저장소 구성. `DATABASE_URL`이 없으면 인메모리 저장소를 사용합니다.
async fn create_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url)
                .await
                .context("failed to connect to database")?;
            Ok(Stores::from_backend(Arc::new(store)))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
            Ok(Stores::in_memory())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    init_logging_from_env()?;
    info!("Starting Taskboard API server...");

    // 자격증명 누락은 여기서 종료
    let config = AppConfig::from_env().context("invalid server configuration")?;
    let addr = config.socket_addr()?;

    let verifier = FirebaseVerifier::new(&config.service_account)
        .context("failed to build identity verifier")?;
    info!(project_id = verifier.project_id(), "Identity verifier initialized");

    let mut state = AppState::new(create_stores(&config).await?);
    match setup_metrics_recorder() {
        Ok(handle) => {
            info!("Prometheus metrics recorder initialized");
            state = state.with_metrics(handle);
        }
        Err(e) => warn!(error = %e, "Prometheus recorder unavailable, /metrics disabled"),
    }
    info!(?state, "Application state initialized");

    let app = create_router(
        create_app(Arc::new(state), Arc::new(verifier), config.exempt_paths.clone()),
        &config,
    );

    info!(%addr, "API server listening");
    info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    info!("Shutdown signal received");
}
