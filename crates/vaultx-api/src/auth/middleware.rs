//! Axum용 접근 가드 미들웨어.
//!
//! 보호된 라우트의 모든 요청은 핸들러 전에 다음 단계를 거칩니다:
//!
//! 1. `Authorization: Bearer <token>` 헤더 확인 → 없으면 `MissingToken`
//! 2. 토큰 서명/만료 검증 → 실패하면 `InvalidToken`
//! 3. `role` 클레임을 허용 목록과 비교 → 클레임이 없거나 문자열이 아니면
//!    `InvalidToken`, 목록에 없으면 `Forbidden`
//!
//! 통과한 요청에는 [`Identity`]가 extensions에 붙고, 핸들러는 [`CurrentUser`]로
//! 꺼내 씁니다. 감사 로그가 연결된 가드는 허용/거부 결과를 모두 기록합니다.

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tracing::debug;

use super::{AllowedRoles, Role, TokenIssuer};
use crate::error::AuthError;
use crate::metrics::record_auth_event;
use crate::repository::{AuditEvent, AuditLog};

const BEARER_PREFIX: &str = "Bearer ";

/// 인증된 요청의 신원 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// 토큰의 `uid` 클레임
    pub uid: String,
    /// 토큰의 `role` 클레임 (허용 목록 통과 후)
    pub role: Role,
}

/// 라우트 그룹 하나에 대한 접근 가드.
///
/// # 사용 예시
///
/// ```rust,ignore
/// let guard = AccessGuard::protect(issuer, AllowedRoles::any_user());
/// let files = Router::new()
///     .route("/upload", post(upload))
///     .route_layer(middleware::from_fn_with_state(guard, access_guard));
/// ```
#[derive(Clone)]
pub struct AccessGuard {
    issuer: TokenIssuer,
    allowed: AllowedRoles,
    audit: Option<Arc<dyn AuditLog>>,
}

impl fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGuard")
            .field("issuer", &self.issuer)
            .field("allowed", &self.allowed)
            .field("audited", &self.audit.is_some())
            .finish()
    }
}

impl AccessGuard {
    /// 허용 역할 목록으로 가드 생성.
    pub fn protect(issuer: TokenIssuer, allowed: AllowedRoles) -> Self {
        Self {
            issuer,
            allowed,
            audit: None,
        }
    }

    /// 가드 결과를 감사 로그에 기록.
    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// 요청 헤더를 검사하여 신원을 확인합니다.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let token = bearer_token(headers)?;

        let claims = self.issuer.verify(token).map_err(|e| {
            debug!(reason = %e, "Token verification failed");
            AuthError::InvalidToken
        })?;

        let role = claims.role().ok_or_else(|| {
            debug!(uid = %claims.uid, "Token has no string role claim");
            AuthError::InvalidToken
        })?;

        let role = match Role::parse(role) {
            Some(role) if self.allowed.admits(role) => role,
            _ => {
                debug!(uid = %claims.uid, role = %role, "Role not allowed on this route");
                return Err(AuthError::Forbidden);
            }
        };

        Ok(Identity {
            uid: claims.uid,
            role,
        })
    }
}

/// `Authorization` 헤더에서 Bearer 토큰 추출.
///
/// 헤더가 없거나, 비어 있거나, `Bearer ` 접두사가 없거나, 접두사 뒤가 비어 있으면
/// 모두 `MissingToken`입니다.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MissingToken)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

/// 접근 가드 미들웨어.
///
/// `axum::middleware::from_fn_with_state`로 [`AccessGuard`]와 함께 등록합니다.
/// 거부된 요청은 핸들러를 실행하지 않고 에러 응답으로 끝납니다.
pub async fn access_guard(
    State(guard): State<AccessGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let result = guard.authorize(request.headers());
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    record_auth_event("guard", outcome);

    if let Some(audit) = &guard.audit {
        let uid = result.as_ref().ok().map(|identity| identity.uid.clone());
        audit.record(AuditEvent::new("guard", outcome).with_user(uid)).await;
    }

    let identity = result?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// 현재 요청의 신원 추출기.
///
/// 접근 가드 뒤에 있는 핸들러에서만 사용합니다.
///
/// ```rust,ignore
/// async fn me(CurrentUser(identity): CurrentUser) -> Json<Identity> {
///     Json(identity)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthError::MissingToken)
    }
}
