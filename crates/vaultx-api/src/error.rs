//! 인증 게이트의 HTTP 에러 응답.
//!
//! 모든 실패는 요청 단위로 종료되며 `{"error": "<message>"}` 형식의 JSON으로
//! 응답합니다. 내부 에러 문자열(저장소 에러 등)은 응답에 포함하지 않습니다.
//!
//! | 에러 | 상태 | 메시지 |
//! |------|------|--------|
//! | `MalformedInput` | 400 | Invalid request |
//! | `InvalidCredentials` | 400 | Invalid credentials |
//! | `MissingToken` | 401 | Missing token |
//! | `InvalidToken` | 401 | Invalid token |
//! | `Forbidden` | 403 | Forbidden |
//! | `AlreadyExists` | 500 | User already exists |
//! | `StoreFailure` | 500 | Internal server error |

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// 에러 응답 본문.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// 인증/인가 에러.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// 요청 본문을 해석할 수 없거나 필수 필드가 비어 있음
    #[error("Invalid request")]
    MalformedInput,
    /// 이미 가입된 이메일
    #[error("User already exists")]
    AlreadyExists,
    /// 알 수 없는 이메일 또는 틀린 비밀번호 (의도적으로 구분하지 않음)
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Bearer 토큰 없음
    #[error("Missing token")]
    MissingToken,
    /// 서명 불일치, 만료, 형식 오류, 역할 클레임 누락
    #[error("Invalid token")]
    InvalidToken,
    /// 유효한 토큰이지만 역할이 허용 목록에 없음
    #[error("Forbidden")]
    Forbidden,
    /// 예상하지 못한 저장소 실패
    #[error("Internal server error")]
    StoreFailure,
}

impl AuthError {
    /// HTTP 상태 코드.
    ///
    /// 가입 충돌은 기존 클라이언트와의 호환을 위해 저장소 실패와 같은 500을 사용합니다.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MalformedInput | AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::AlreadyExists | AuthError::StoreFailure => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 메트릭 라벨용 식별자.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MalformedInput => "malformed_input",
            AuthError::AlreadyExists => "already_exists",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::Forbidden => "forbidden",
            AuthError::StoreFailure => "store_failure",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (self.status_code(), body).into_response()
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
        AuthError::MalformedInput
    }
}

/// 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::MalformedInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::InvalidCredentials.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::AlreadyExists.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::StoreFailure.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AuthError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Forbidden" }));
    }

    #[test]
    fn test_store_failure_message_is_generic() {
        assert_eq!(AuthError::StoreFailure.to_string(), "Internal server error");
    }
}
