//! 감사 로그 endpoint (관리자 전용).

use std::sync::Arc;

use axum::{extract::State, middleware, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::auth::{access_guard, AccessGuard};
use crate::error::{ApiResult, AuthError};
use crate::repository::verify_chain;
use crate::state::AppState;

/// 체인 검증 결과.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuditVerifyResponse {
    pub valid: bool,
    /// 저장된 항목 수
    pub entries: usize,
    /// 처음 발견된 문제 (정상이면 없음)
    pub error: Option<String>,
}

/// 감사 로그 해시 체인 검증.
///
/// GET /audit/verify
pub async fn verify(State(state): State<Arc<AppState>>) -> ApiResult<Json<AuditVerifyResponse>> {
    let entries = state.auth.audit().entries().await.map_err(|e| {
        error!(error = %e, "Audit log read failed");
        AuthError::StoreFailure
    })?;

    let response = match verify_chain(&entries) {
        Ok(count) => AuditVerifyResponse {
            valid: true,
            entries: count,
            error: None,
        },
        Err(e) => {
            warn!(error = %e, "Audit chain verification failed");
            AuditVerifyResponse {
                valid: false,
                entries: entries.len(),
                error: Some(e.to_string()),
            }
        }
    };

    Ok(Json(response))
}

/// 감사 라우터 생성. `guard`는 관리자만 허용해야 합니다.
pub fn audit_router(guard: AccessGuard) -> Router<Arc<AppState>> {
    Router::new()
        .route("/verify", get(verify))
        .route_layer(middleware::from_fn_with_state(guard, access_guard))
}
