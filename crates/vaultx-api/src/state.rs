//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 여러 요청 간에 공유됩니다.
//! 서명 비밀키와 해싱 파라미터는 시작 시 한 번 설정되며 이후 변경되지 않습니다.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use vaultx_core::AuthConfig;

use crate::auth::{AuthService, PasswordError, PasswordHashing, TokenIssuer};
use crate::repository::{AuditLog, UserStore};

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 가입/로그인 서비스 (저장소, 해셔, 토큰 발급기 포함)
    pub auth: AuthService,

    /// 데이터베이스 연결 풀 (없으면 인메모리 저장소로 동작)
    pub db_pool: Option<sqlx::PgPool>,

    /// Prometheus 핸들 (`/metrics` 렌더링용)
    pub metrics: Option<PrometheusHandle>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 인증 서비스로 AppState 생성.
    pub fn new(auth: AuthService) -> Self {
        Self {
            auth,
            db_pool: None,
            metrics: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 인증 설정과 저장소로 AppState 생성.
    ///
    /// # Errors
    ///
    /// 비밀번호 해싱 파라미터가 유효하지 않으면 에러를 반환합니다.
    pub fn from_config(config: &AuthConfig, store: Arc<dyn UserStore>) -> Result<Self, PasswordError> {
        let hashing = PasswordHashing::new(config.password)?;
        let issuer = TokenIssuer::new(&config.jwt_secret);

        Ok(Self::new(AuthService::new(store, hashing, issuer)))
    }

    /// 데이터베이스 풀 설정.
    pub fn with_db_pool(mut self, pool: sqlx::PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// 감사 로그 저장소 설정.
    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.auth = self.auth.with_audit(audit);
        self
    }

    /// Prometheus 핸들 설정.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }

    /// 자격증명 저장소 상태 확인.
    pub async fn is_store_healthy(&self) -> bool {
        self.auth.store().ping().await
    }
}

/// 테스트용 AppState 생성.
///
/// 인메모리 저장소와 낮은 해싱 비용을 사용합니다.
#[cfg(test)]
pub fn create_test_state() -> AppState {
    use crate::repository::MemoryUserStore;
    use secrecy::SecretString;
    use vaultx_core::PasswordConfig;

    let hashing = PasswordHashing::new(PasswordConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .expect("valid test hashing params");
    let issuer = TokenIssuer::new(&SecretString::from(
        "test-secret-key-for-jwt-testing-minimum-32-chars",
    ));

    AppState::new(AuthService::new(
        Arc::new(MemoryUserStore::new()),
        hashing,
        issuer,
    ))
}
