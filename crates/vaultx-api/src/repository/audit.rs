//! 인증 감사 로그.
//!
//! 가입, 로그인, 접근 가드 결과를 추가 전용(append-only) 해시 체인으로 기록합니다.
//! 각 항목의 해시는 이전 항목의 해시를 포함하므로, 중간 항목을 수정하거나
//! 삭제하면 [`verify_chain`]이 끊어진 지점을 찾아냅니다.
//!
//! 항목에는 사용자 ID만 남기며 이메일, 비밀번호, 토큰은 기록하지 않습니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tokio::sync::Mutex;
use tracing::error;

use super::StoreError;

/// 동시 추가를 직렬화하는 PostgreSQL advisory lock 키
const AUDIT_CHAIN_LOCK: i64 = 0x5641_554c_5458;

/// 해시 입력 필드 구분자
const FIELD_SEPARATOR: &[u8] = &[0x1f];

/// 기록할 감사 이벤트.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// "register" | "login" | "guard"
    pub action: String,
    /// "ok" 또는 에러 종류
    pub outcome: String,
    /// 알려진 경우 사용자 ID
    pub user_id: Option<String>,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>, outcome: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            outcome: outcome.into(),
            user_id: None,
        }
    }

    #[must_use]
    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }
}

/// 체인에 봉인된 감사 항목.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct AuditEntry {
    /// 1부터 시작하는 연속 번호
    pub seq: i64,
    pub action: String,
    pub outcome: String,
    pub user_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
    /// 직전 항목의 해시 (첫 항목은 없음)
    pub prev_hash: Option<String>,
    /// 이 항목의 SHA-256 해시 (hex)
    pub entry_hash: String,
}

impl AuditEntry {
    /// 이벤트를 체인의 다음 항목으로 봉인합니다.
    pub fn seal(
        seq: i64,
        event: AuditEvent,
        recorded_at: DateTime<Utc>,
        prev_hash: Option<String>,
    ) -> Self {
        let mut entry = Self {
            seq,
            action: event.action,
            outcome: event.outcome,
            user_id: event.user_id,
            recorded_at,
            prev_hash,
            entry_hash: String::new(),
        };
        entry.entry_hash = entry.compute_hash();
        entry
    }

    /// 저장된 필드로 해시를 다시 계산합니다.
    ///
    /// 시각은 마이크로초 단위로 넣습니다 (PostgreSQL `TIMESTAMPTZ` 정밀도).
    pub fn compute_hash(&self) -> String {
        let seq = self.seq.to_string();
        let micros = self.recorded_at.timestamp_micros().to_string();

        let mut hasher = Sha256::new();
        hasher.update(self.prev_hash.as_deref().unwrap_or("").as_bytes());
        for field in [
            seq.as_str(),
            self.action.as_str(),
            self.outcome.as_str(),
            self.user_id.as_deref().unwrap_or(""),
            micros.as_str(),
        ] {
            hasher.update(FIELD_SEPARATOR);
            hasher.update(field.as_bytes());
        }

        hex::encode(hasher.finalize())
    }
}

/// 체인 검증 실패.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("sequence gap at entry {seq}, expected {expected}")]
    SequenceGap { seq: i64, expected: i64 },
    #[error("broken link at entry {seq}")]
    BrokenLink { seq: i64 },
    #[error("hash mismatch at entry {seq}")]
    HashMismatch { seq: i64 },
}

/// 순서대로 정렬된 항목의 해시 체인을 검증합니다.
///
/// 성공 시 검증한 항목 수를 반환하고, 실패 시 처음 발견된 문제를 반환합니다.
pub fn verify_chain(entries: &[AuditEntry]) -> Result<usize, ChainError> {
    let mut prev_hash: Option<&str> = None;

    for (index, entry) in entries.iter().enumerate() {
        let expected = index as i64 + 1;
        if entry.seq != expected {
            return Err(ChainError::SequenceGap {
                seq: entry.seq,
                expected,
            });
        }
        if entry.prev_hash.as_deref() != prev_hash {
            return Err(ChainError::BrokenLink { seq: entry.seq });
        }
        if entry.compute_hash() != entry.entry_hash {
            return Err(ChainError::HashMismatch { seq: entry.seq });
        }
        prev_hash = Some(entry.entry_hash.as_str());
    }

    Ok(entries.len())
}

/// 감사 로그 저장소 계약.
///
/// `append`는 동시 호출에서도 체인이 갈라지지 않도록 직렬화되어야 합니다.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// 이벤트를 체인 끝에 추가.
    async fn append(&self, event: AuditEvent) -> Result<AuditEntry, StoreError>;

    /// 전체 항목을 순서대로 조회.
    async fn entries(&self) -> Result<Vec<AuditEntry>, StoreError>;

    /// 추가하고, 실패하면 로그만 남깁니다.
    ///
    /// 감사 로그 장애로 인증 요청 자체를 실패시키지 않습니다.
    async fn record(&self, event: AuditEvent) {
        let action = event.action.clone();
        if let Err(e) = self.append(event).await {
            error!(action = %action, error = %e, "Audit append failed");
        }
    }
}

/// PostgreSQL 감사 로그 (`audit_log` 테이블).
#[derive(Debug, Clone)]
pub struct PgAuditLog {
    pool: PgPool,
}

impl PgAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PgAuditLog {
    async fn append(&self, event: AuditEvent) -> Result<AuditEntry, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(AUDIT_CHAIN_LOCK)
            .execute(&mut *tx)
            .await?;

        let last: Option<(i64, String)> = sqlx::query_as(
            "SELECT seq, entry_hash FROM audit_log ORDER BY seq DESC LIMIT 1",
        )
        .fetch_optional(&mut *tx)
        .await?;

        let (seq, prev_hash) = match last {
            Some((seq, hash)) => (seq + 1, Some(hash)),
            None => (1, None),
        };
        let entry = AuditEntry::seal(seq, event, Utc::now(), prev_hash);

        sqlx::query(
            r#"
            INSERT INTO audit_log (seq, action, outcome, user_id, recorded_at, prev_hash, entry_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.seq)
        .bind(&entry.action)
        .bind(&entry.outcome)
        .bind(&entry.user_id)
        .bind(entry.recorded_at)
        .bind(&entry.prev_hash)
        .bind(&entry.entry_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(entry)
    }

    async fn entries(&self) -> Result<Vec<AuditEntry>, StoreError> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT seq, action, outcome, user_id, recorded_at, prev_hash, entry_hash
            FROM audit_log
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

/// 메모리 감사 로그.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn append(&self, event: AuditEvent) -> Result<AuditEntry, StoreError> {
        let mut entries = self.entries.lock().await;
        let prev_hash = entries.last().map(|e| e.entry_hash.clone());
        let entry = AuditEntry::seal(entries.len() as i64 + 1, event, Utc::now(), prev_hash);
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn entries(&self) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self.entries.lock().await.clone())
    }
}
