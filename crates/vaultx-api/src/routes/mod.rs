//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/` - 서비스 배너
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/metrics` - Prometheus 메트릭
//! - `/auth` - 가입, 로그인, 현재 신원
//! - `/files` - 파일 업로드/검색 (보호됨)
//! - `/audit` - 감사 로그 체인 검증 (관리자 전용)

pub mod audit;
pub mod auth;
pub mod files;
pub mod health;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

pub use audit::{audit_router, AuditVerifyResponse};
pub use auth::{auth_router, Credentials, MessageResponse, TokenResponse};
pub use files::files_router;
pub use health::{health_router, HealthResponse};

use crate::auth::{AccessGuard, AllowedRoles};
use crate::middleware::metrics_layer;
use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 보호 라우트는 일반 사용자와 관리자를 모두 허용하고, `/audit`은 관리자만 허용합니다.
/// 가드 결과는 인증 서비스와 같은 감사 로그에 기록됩니다.
pub fn create_router(state: Arc<AppState>) -> Router {
    let issuer = state.auth.issuer().clone();
    let audit = state.auth.audit().clone();
    let guard =
        AccessGuard::protect(issuer.clone(), AllowedRoles::any_user()).with_audit(audit.clone());
    let admin_guard = AccessGuard::protect(issuer, AllowedRoles::admin_only()).with_audit(audit);

    Router::new()
        .route("/", get(health::root))
        .route("/metrics", get(health::metrics_handler))
        .nest("/health", health_router())
        .nest("/auth", auth_router(guard.clone()))
        .nest("/files", files_router(guard))
        .nest("/audit", audit_router(admin_guard))
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
