//! VaultX 공통 에러 타입.
//!
//! 설정 로드와 로깅 초기화처럼 프로세스 시작 단계에서 발생하는 에러를 정의합니다.

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정 소스(파일, 환경 변수) 로드 또는 역직렬화 실패
    #[error("configuration load failed: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    /// 로드는 되었지만 값이 유효하지 않은 설정
    #[error("invalid configuration: {0}")]
    Config(String),

    /// 로깅 시스템 초기화 실패
    #[error("logging initialization failed: {0}")]
    Logging(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
