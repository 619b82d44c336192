//! 인증 및 권한 부여.
//!
//! JWT 기반 인증과 역할 기반 접근 제어(RBAC)를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`Claims`], [`TokenIssuer`]: HS256 토큰 발급/검증
//! - [`PasswordHashing`]: Argon2id 비밀번호 해싱
//! - [`Role`], [`AllowedRoles`]: 역할과 라우트별 허용 목록
//! - [`AccessGuard`], [`access_guard`]: 보호 라우트용 미들웨어
//! - [`CurrentUser`]: 가드 뒤 핸들러용 신원 추출기
//! - [`AuthService`]: 가입/로그인 흐름
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn protected_handler(CurrentUser(identity): CurrentUser) -> impl IntoResponse {
//!     format!("Hello, {}!", identity.uid)
//! }
//! ```

mod jwt;
mod middleware;
mod password;
mod roles;
mod service;

pub use jwt::{Claims, JwtError, TokenIssuer, TOKEN_TTL_HOURS};
pub use middleware::{access_guard, AccessGuard, CurrentUser, Identity};
pub use password::{PasswordError, PasswordHashing};
pub use roles::{AllowedRoles, Role};
pub use service::AuthService;
