//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 서명 키는 시작 시 한 번만 읽히며, 비어 있으면 서버가 요청을 받기 전에 실패합니다.

use std::path::Path;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::password::PasswordPolicy;

/// 환경 변수 접두사 (`IDENTITY__AUTH__TOKEN_SECRET` 형태).
pub const ENV_PREFIX: &str = "IDENTITY";

/// 설정 에러.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// 토큰 서명 키가 없거나 비어 있음
    #[error("토큰 서명 키가 설정되지 않았습니다 (auth.token_secret)")]
    MissingSigningKey,

    /// 설정 소스 로드/역직렬화 실패
    #[error("설정 로드 실패: {0}")]
    Load(#[from] config::ConfigError),
}

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 토큰 인증 설정
    pub auth: AuthConfig,
    /// 비밀번호 정책
    pub password: PasswordPolicy,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// `host:port` 형식의 바인딩 주소.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 데이터베이스 설정.
///
/// `url`이 없으면 인메모리 저장소로 동작합니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 문자열
    #[serde(skip_serializing)]
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connection_timeout_secs: 30,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 토큰 인증 설정.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 대칭 서명 키. 직렬화/로그 출력 대상이 아닙니다.
    #[serde(skip_serializing)]
    pub token_secret: Option<String>,
    /// 만료 검증 시 허용 시계 오차 (초)
    pub leeway_secs: u64,
    /// 시작 시 생성을 보장할 역할 목록
    pub seed_roles: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            leeway_secs: 0,
            seed_roles: vec!["Admin".to_string(), "Gerente".to_string()],
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "token_secret",
                &self.token_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("leeway_secs", &self.leeway_secs)
            .field("seed_roles", &self.seed_roles)
            .finish()
    }
}

impl AuthConfig {
    /// 서명 키를 꺼냅니다.
    ///
    /// 키가 없거나 공백뿐이면 `MissingSigningKey`.
    pub fn signing_secret(&self) -> Result<SecretString, ConfigurationError> {
        match self.token_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => Ok(SecretString::from(secret.to_string())),
            _ => Err(ConfigurationError::MissingSigningKey),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드하고 검증합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let builder = Self::defaults()?
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.seed_roles")
                    .try_parsing(true),
            );

        Self::build(builder)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, ConfigurationError> {
        Self::load("config/default.toml")
    }

    /// TOML 문자열에서 설정을 로드합니다 (환경 변수 무시).
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigurationError> {
        let builder =
            Self::defaults()?.add_source(config::File::from_str(toml, config::FileFormat::Toml));
        Self::build(builder)
    }

    /// 로드된 설정이 서버 시작에 충분한지 확인합니다.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.auth.signing_secret().map(|_| ())
    }

    fn defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigurationError> {
        Ok(config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigurationError> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
