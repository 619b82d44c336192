//! 파일 endpoint (placeholder).
//!
//! 접근 가드 뒤에 있으며 실제 저장/검색 로직은 아직 없습니다.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::auth::{access_guard, AccessGuard, CurrentUser};
use crate::state::AppState;

/// 파일 업로드.
///
/// POST /files/upload
pub async fn upload(CurrentUser(identity): CurrentUser) -> Json<Value> {
    Json(json!({
        "message": "Upload endpoint stub",
        "uid": identity.uid,
    }))
}

/// 파일 검색.
///
/// GET /files/search
pub async fn search(CurrentUser(_identity): CurrentUser) -> Json<Value> {
    Json(json!({ "results": [] }))
}

/// 파일 라우터 생성. 모든 라우트에 `guard`가 적용됩니다.
pub fn files_router(guard: AccessGuard) -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload))
        .route("/search", get(search))
        .route_layer(middleware::from_fn_with_state(guard, access_guard))
}
