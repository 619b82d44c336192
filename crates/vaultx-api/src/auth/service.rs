//! 가입 및 로그인 흐름.
//!
//! 비밀번호 해싱은 CPU 바운드 작업이므로 blocking 스레드 풀에서 실행합니다.
//! 로그에는 사용자 ID만 남기고 이메일, 비밀번호, 토큰은 남기지 않습니다.
//! 가입/로그인 결과는 같은 기준으로 감사 로그에도 기록됩니다.

use std::sync::{Arc, OnceLock};

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{PasswordError, PasswordHashing, TokenIssuer};
use crate::error::AuthError;
use crate::metrics::record_auth_event;
use crate::repository::{AuditEvent, AuditLog, MemoryAuditLog, NewUser, StoreError, UserStore};

/// 없는 이메일로 로그인할 때 검증에 사용하는 비밀번호
const DUMMY_PASSWORD: &str = "vaultx-dummy-password";

/// 인증 서비스.
///
/// 저장소, 해셔, 토큰 발급기를 묶어 가입/로그인을 수행합니다.
/// 복제 비용이 작아 요청마다 공유해도 됩니다.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hashing: PasswordHashing,
    issuer: TokenIssuer,
    audit: Arc<dyn AuditLog>,
    dummy_hash: Arc<OnceLock<Option<String>>>,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, hashing: PasswordHashing, issuer: TokenIssuer) -> Self {
        Self {
            store,
            hashing,
            issuer,
            audit: Arc::new(MemoryAuditLog::new()),
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    /// 감사 로그 저장소 교체 (기본값은 메모리).
    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    /// 감사 로그.
    pub fn audit(&self) -> &Arc<dyn AuditLog> {
        &self.audit
    }

    /// 토큰 발급기.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// 자격증명 저장소.
    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// 새 사용자 가입.
    ///
    /// 성공 시 저장소가 부여한 사용자 ID를 반환합니다.
    ///
    /// # Errors
    ///
    /// - `MalformedInput`: 이메일 또는 비밀번호가 비어 있음
    /// - `AlreadyExists`: 이미 가입된 이메일
    /// - `StoreFailure`: 그 밖의 저장소/해싱 실패
    pub async fn register(&self, email: &str, password: &str) -> Result<Uuid, AuthError> {
        let result = self.register_inner(email, password).await;
        record_auth_event("register", outcome(&result));
        self.audit
            .record(
                AuditEvent::new("register", outcome(&result))
                    .with_user(result.as_ref().ok().map(Uuid::to_string)),
            )
            .await;
        result
    }

    async fn register_inner(&self, email: &str, password: &str) -> Result<Uuid, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MalformedInput);
        }

        let hashing = self.hashing.clone();
        let password = password.to_owned();
        let password_hash = run_blocking(move || hashing.hash(&password))
            .await?
            .map_err(|e| {
                error!(error = %e, "Password hashing failed");
                AuthError::StoreFailure
            })?;

        let new_user = NewUser {
            email: email.to_owned(),
            password_hash,
        };

        match self.store.create(new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, role = %user.role, "User registered");
                Ok(user.id)
            }
            Err(StoreError::Conflict) => {
                debug!("Registration rejected: email already registered");
                Err(AuthError::AlreadyExists)
            }
            Err(StoreError::Backend(e)) => {
                error!(error = %e, "User insert failed");
                Err(AuthError::StoreFailure)
            }
        }
    }

    /// 로그인 후 서명된 Access Token 반환.
    ///
    /// 없는 이메일과 틀린 비밀번호는 같은 `InvalidCredentials`로 응답하며,
    /// 없는 이메일에도 더미 해시 검증을 수행해 응답 시간 차이를 줄입니다.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let result = self.login_inner(email, password).await;
        record_auth_event("login", outcome(&result));
        self.audit
            .record(
                AuditEvent::new("login", outcome(&result))
                    .with_user(result.as_ref().ok().map(|(id, _)| id.to_string())),
            )
            .await;
        result.map(|(_, token)| token)
    }

    async fn login_inner(&self, email: &str, password: &str) -> Result<(Uuid, String), AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MalformedInput);
        }

        let user = match self.store.find_by_email(email).await {
            Ok(user) => user,
            Err(e) => {
                // 로그인 계약상 저장소 장애도 자격증명 실패로 응답한다
                error!(error = %e, "User lookup failed");
                None
            }
        };

        let Some(user) = user else {
            self.burn_dummy_verify(password).await;
            debug!("Login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let hashing = self.hashing.clone();
        let candidate = password.to_owned();
        let stored_hash = user.password_hash.clone();
        let verified = run_blocking(move || hashing.verify(&candidate, &stored_hash)).await?;

        match verified {
            Ok(()) => {}
            Err(PasswordError::Mismatch) => {
                debug!(user_id = %user.id, "Login rejected: password mismatch");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Stored password hash is unusable");
                return Err(AuthError::InvalidCredentials);
            }
        }

        let token = self
            .issuer
            .issue_for(&user.id.to_string(), &user.role)
            .map_err(|e| {
                error!(user_id = %user.id, error = %e, "Token issuance failed");
                AuthError::StoreFailure
            })?;

        info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok((user.id, token))
    }

    async fn burn_dummy_verify(&self, password: &str) {
        let hashing = self.hashing.clone();
        let dummy_hash = self.dummy_hash.clone();
        let candidate = password.to_owned();

        let _ = run_blocking(move || {
            let hash = dummy_hash.get_or_init(|| hashing.hash(DUMMY_PASSWORD).ok());
            if let Some(hash) = hash {
                let _ = hashing.verify(&candidate, hash);
            }
        })
        .await;
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!(error = %e, "Blocking password task failed");
        AuthError::StoreFailure
    })
}

fn outcome<T>(result: &Result<T, AuthError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    }
}
