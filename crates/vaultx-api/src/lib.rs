//! VaultX 인증 게이트 API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Argon2id 해싱을 사용하는 가입/로그인
//! - HS256 JWT Access Token 발급 및 검증
//! - 역할 기반 접근 가드 미들웨어
//! - 헬스 체크 엔드포인트와 Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: JWT 인증 및 권한 관리
//! - [`repository`]: 자격증명 저장소
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod state;

pub use auth::{AccessGuard, AllowedRoles, AuthService, Claims, CurrentUser, Identity, Role, TokenIssuer};
pub use error::{ApiResult, AuthError, ErrorBody};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use routes::create_router;
pub use state::AppState;
