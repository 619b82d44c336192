//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 로드합니다.
//! 로드 순서는 기본값 → 설정 파일(선택) → 환경 변수(`VAULTX__` 접두사)이며,
//! 프로세스 시작 시 한 번만 로드되어 이후 변경되지 않습니다.

use std::net::SocketAddr;
use std::path::Path;

use config::builder::DefaultState;
use config::ConfigBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::logging::{LogConfig, LogFormat};

/// HS256 서명 비밀 키의 최소 길이 (바이트)
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// 애플리케이션 설정.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 인증 설정
    pub auth: AuthConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// CORS 허용 origin 목록. 비어 있으면 모든 origin을 허용합니다.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// 소켓 주소 반환.
    ///
    /// # Errors
    /// `host:port` 형식이 유효하지 않으면 `CoreError::Config`를 반환합니다.
    pub fn socket_addr(&self) -> CoreResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| CoreError::Config(format!("invalid server address: {}", e)))
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 URL. 없으면 메모리 저장소로 동작합니다.
    #[serde(default)]
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
}

/// 인증 설정.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// 토큰 서명용 대칭 비밀 키 (필수, 로그에 노출되지 않음)
    pub jwt_secret: SecretString,
    /// 비밀번호 해싱 작업 계수
    pub password: PasswordConfig,
}

/// Argon2 작업 계수.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PasswordConfig {
    /// 메모리 비용 (KiB)
    pub memory_kib: u32,
    /// 반복 횟수
    pub iterations: u32,
    /// 병렬도
    pub parallelism: u32,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
    /// span 진입/종료 이벤트 출력
    pub span_events: bool,
    /// 파일명과 줄 번호 출력
    pub with_file: bool,
    /// 모듈 경로 출력
    pub with_target: bool,
}

impl LoggingConfig {
    /// 로깅 초기화용 [`LogConfig`]로 변환합니다.
    ///
    /// 알 수 없는 형식은 `pretty`로 처리합니다.
    pub fn to_log_config(&self) -> LogConfig {
        let format = self.format.parse().unwrap_or(LogFormat::Pretty);
        LogConfig::new(self.level.clone())
            .with_format(format)
            .with_span_events(self.span_events)
            .with_file(self.with_file)
            .with_target(self.with_target)
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// `.env` 파일이 있으면 먼저 읽습니다. 설정 파일이 없어도 에러가 아니며,
    /// 이 경우 환경 변수(예: `VAULTX__AUTH__JWT_SECRET`)만으로 구성됩니다.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let _ = dotenvy::dotenv();

        let builder = Self::defaults()?
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("VAULTX")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            );

        Self::build(builder)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> CoreResult<Self> {
        Self::load("config/default.toml")
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 10)?
            .set_default("database.connection_timeout_secs", 10)?
            .set_default("auth.password.memory_kib", 19456)?
            .set_default("auth.password.iterations", 2)?
            .set_default("auth.password.parallelism", 1)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .set_default("logging.span_events", false)?
            .set_default("logging.with_file", false)?
            .set_default("logging.with_target", true)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> CoreResult<Self> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 로드된 값을 검증합니다.
    pub fn validate(&self) -> CoreResult<()> {
        let secret_len = self.auth.jwt_secret.expose_secret().len();
        if secret_len == 0 {
            return Err(CoreError::Config("auth.jwt_secret is empty".to_string()));
        }
        if secret_len < MIN_JWT_SECRET_LEN {
            return Err(CoreError::Config(format!(
                "auth.jwt_secret must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            )));
        }

        let password = &self.auth.password;
        if password.memory_kib == 0 || password.iterations == 0 || password.parallelism == 0 {
            return Err(CoreError::Config(
                "auth.password work factor values must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
