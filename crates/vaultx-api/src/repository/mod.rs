//! 자격증명 저장소와 감사 로그.
//!
//! 데이터베이스 접근 로직을 라우트 핸들러에서 분리하여 관리합니다.
//! 저장소는 [`UserStore`], 감사 로그는 [`AuditLog`] 트레이트 뒤에 있으며
//! 각각 PostgreSQL 구현과 인메모리 구현이 있습니다.

pub mod audit;
pub mod users;

pub use audit::{
    verify_chain, AuditEntry, AuditEvent, AuditLog, ChainError, MemoryAuditLog, PgAuditLog,
};
pub use users::{MemoryUserStore, NewUser, PgUserStore, StoreError, User, UserStore};
