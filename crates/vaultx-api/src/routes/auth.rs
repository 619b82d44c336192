//! 가입/로그인 endpoint.
//!
//! # 엔드포인트
//!
//! - `POST /auth/register` - 이메일/비밀번호로 가입
//! - `POST /auth/login` - 로그인 후 Access Token 발급
//! - `GET /auth/me` - 현재 토큰의 신원 (보호됨)

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::{access_guard, AccessGuard, CurrentUser, Identity};
use crate::error::ApiResult;
use crate::state::AppState;

/// 가입/로그인 요청 본문.
///
/// 비밀번호가 로그에 남지 않도록 `Debug`를 구현하지 않습니다.
#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// 가입 성공 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// 로그인 성공 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// 새 사용자 가입.
///
/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(credentials) = payload?;

    state
        .auth
        .register(&credentials.email, &credentials.password)
        .await?;

    Ok(Json(MessageResponse {
        message: "User registered".to_string(),
    }))
}

/// 로그인.
///
/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Json(credentials) = payload?;

    let token = state
        .auth
        .login(&credentials.email, &credentials.password)
        .await?;

    Ok(Json(TokenResponse { token }))
}

/// 현재 신원 조회.
///
/// GET /auth/me
pub async fn me(CurrentUser(identity): CurrentUser) -> Json<Identity> {
    Json(identity)
}

/// 인증 라우터 생성.
///
/// `guard`는 `/me`에만 적용됩니다.
pub fn auth_router(guard: AccessGuard) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(guard, access_guard));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}
