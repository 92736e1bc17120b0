//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! Arc로 래핑되어 여러 요청 간에 공유됩니다. 서명 키에서 파생된 발급기/검증기는
//! 서버 시작 전에 한 번 만들어진 뒤 읽기 전용으로만 사용됩니다.

use std::sync::Arc;

use identity_core::{AuthConfig, IdentityStore};

use crate::auth::{TokenError, TokenIssuer, TokenValidator};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 사용자/역할 저장소 (자격증명 검증 포함)
    pub store: Arc<dyn IdentityStore>,

    /// 토큰 발급기
    pub issuer: Arc<TokenIssuer>,

    /// 토큰 검증기
    pub validator: Arc<TokenValidator>,

    /// 저장소 종류 ("memory" | "postgres")
    pub store_backend: &'static str,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    pub fn new(
        store: Arc<dyn IdentityStore>,
        issuer: TokenIssuer,
        validator: TokenValidator,
    ) -> Self {
        Self {
            store,
            issuer: Arc::new(issuer),
            validator: Arc::new(validator),
            store_backend: "memory",
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 인증 설정에서 발급기/검증기를 만들어 상태를 생성합니다.
    ///
    /// 서명 키가 없으면 여기서 실패하므로 서버는 요청을 받기 시작하지 않습니다.
    pub fn from_config(auth: &AuthConfig, store: Arc<dyn IdentityStore>) -> Result<Self, TokenError> {
        let secret = auth.signing_secret()?;
        let issuer = TokenIssuer::new(&secret)?;
        let validator = TokenValidator::new(&secret, auth.leeway_secs)?;
        Ok(Self::new(store, issuer, validator))
    }

    /// 저장소 종류 설정.
    pub fn with_store_backend(mut self, backend: &'static str) -> Self {
        self.store_backend = backend;
        self
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}

/// 테스트용 상태 생성 (인메모리 저장소).
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state(secret: &str) -> AppState {
    use identity_core::InMemoryIdentityStore;

    let auth = AuthConfig {
        token_secret: Some(secret.to_string()),
        ..Default::default()
    };
    AppState::from_config(&auth, Arc::new(InMemoryIdentityStore::default()))
        .expect("test secret must not be empty")
}
