//! 사용자 자격증명 저장소.
//!
//! 인증 흐름은 [`UserStore`] 트레이트만 알고, 실제 저장 엔진은 교체 가능합니다.
//! - [`PgUserStore`]: PostgreSQL (`users` 테이블)
//! - [`MemoryUserStore`]: 프로세스 메모리 (DB 없이 실행, 테스트)
//!
//! 이메일은 대소문자를 구분하는 정확한 일치로 비교하며, 고유 제약을 가집니다.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::auth::Role;

/// 저장된 사용자.
///
/// 응답으로 직렬화되지 않으며, `Debug` 출력에서 비밀번호 해시를 숨깁니다.
#[derive(Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// 새 사용자 입력.
///
/// 역할은 지정하지 않으며, 저장소 기본값(`user`)이 부여됩니다.
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

/// 저장소 에러.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 이메일 고유 제약 위반
    #[error("email already registered")]
    Conflict,
    /// 그 밖의 저장소 실패
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return StoreError::Conflict;
            }
        }
        StoreError::Backend(e.to_string())
    }
}

/// 자격증명 저장소 계약.
///
/// 구현체는 동시 삽입/조회에 대해 스스로 안전해야 하며, 같은 이메일의 동시
/// 삽입 중 정확히 하나만 성공해야 합니다.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 사용자 삽입. 이메일이 이미 있으면 `StoreError::Conflict`.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// 이메일 정확 일치로 사용자 조회.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// 저장소 연결 상태 확인 (readiness 체크용).
    async fn ping(&self) -> bool;
}

/// PostgreSQL 저장소.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `users`, `audit_log` 테이블 마이그레이션 실행.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        info!("Running database migrations...");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        info!("Migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, role, created_at
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

/// 메모리 저장소.
///
/// 쓰기 잠금 안에서 중복 확인과 삽입을 함께 수행합니다.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 사용자 수.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// 저장소가 비어 있는지 확인.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// 사용자 역할 변경.
    ///
    /// 관리 프로세스가 역할을 바꾸는 경우를 흉내 냅니다. 이미 발급된 토큰에는
    /// 반영되지 않고 다음 로그인부터 적용됩니다.
    pub async fn set_role(&self, email: &str, role: Role) -> bool {
        match self.users.write().await.get_mut(email) {
            Some(user) => {
                user.role = role.as_str().to_string();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&new_user.email) {
            return Err(StoreError::Conflict);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: Role::default().as_str().to_string(),
            created_at: Utc::now(),
        };
        users.insert(user.email.clone(), user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn ping(&self) -> bool {
        true
    }
}
