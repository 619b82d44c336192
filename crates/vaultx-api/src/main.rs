//! VaultX 인증 게이트 API 서버.
//!
//! 설정을 로드하고 자격증명 저장소를 연결한 뒤 Axum 서버를 시작합니다.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

use vaultx_api::metrics::setup_metrics_recorder;
use vaultx_api::repository::{MemoryUserStore, PgAuditLog, PgUserStore, UserStore};
use vaultx_api::routes::create_router;
use vaultx_api::state::AppState;
use vaultx_core::{init_logging, AppConfig, DatabaseConfig, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_default().context("failed to load configuration")?;

    init_logging(config.logging.to_log_config()).context("failed to initialize logging")?;

    info!("Starting VaultX API server...");

    let addr = config.server.socket_addr().map_err(|e| {
        error!(
            host = %config.server.host,
            port = config.server.port,
            error = %e,
            "Invalid socket address, check VAULTX__SERVER__HOST and VAULTX__SERVER__PORT"
        );
        e
    })?;

    let (store, db_pool) = connect_store(&config.database).await?;

    let mut state = AppState::from_config(&config.auth, store)
        .context("invalid password hashing parameters")?;
    if let Some(pool) = db_pool.clone() {
        state = state
            .with_audit(Arc::new(PgAuditLog::new(pool.clone())))
            .with_db_pool(pool);
    }

    match setup_metrics_recorder() {
        Ok(handle) => {
            info!("Prometheus metrics recorder initialized");
            state = state.with_metrics(handle);
        }
        Err(e) => warn!(error = %e, "Metrics recorder unavailable, /metrics disabled"),
    }

    let state = Arc::new(state);
    info!(
        version = %state.version,
        has_db = state.db_pool.is_some(),
        has_metrics = state.metrics.is_some(),
        "Application state initialized"
    );

    let app = create_router(state).layer(cors_layer(&config.server));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown initiated, cleaning up...");
    if let Some(pool) = db_pool {
        pool.close().await;
    }
    info!("Server stopped gracefully");

    Ok(())
}

/// 자격증명 저장소 연결.
///
/// `database.url`이 없으면 메모리 저장소를 사용합니다. 이 경우 재시작 시 사용자가 사라집니다.
async fn connect_store(
    config: &DatabaseConfig,
) -> anyhow::Result<(Arc<dyn UserStore>, Option<sqlx::PgPool>)> {
    let Some(url) = config.url.as_deref() else {
        warn!("database.url not set, using in-memory credential store and audit log (development only)");
        return Ok((Arc::new(MemoryUserStore::new()), None));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
        .connect(url)
        .await
        .context("failed to connect to PostgreSQL")?;

    let store = PgUserStore::new(pool.clone());
    store.migrate().await.context("database migration failed")?;
    info!("Connected to PostgreSQL successfully");

    Ok((Arc::new(store), Some(pool)))
}

/// CORS 레이어 생성.
///
/// `server.cors_origins`가 비어 있으면 개발 모드로 간주하여 모든 origin을 허용합니다.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let restricted = !origins.is_empty();
    let allow_origin = if restricted {
        info!("CORS configured with {} allowed origins", origins.len());
        AllowOrigin::list(origins)
    } else {
        warn!("No valid CORS origins configured, allowing any origin (development mode)");
        AllowOrigin::any()
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        // 와일드카드 origin과 credentials는 함께 쓸 수 없다
        .allow_credentials(restricted)
        .max_age(Duration::from_secs(3600))
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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
}
