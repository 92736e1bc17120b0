//! 아이덴티티 게이트웨이 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (로그인, 가입, 역할 관리)
//! - HS512 JWT 발급 및 검증
//! - PostgreSQL 아이덴티티 저장소
//! - 헬스 체크 엔드포인트
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 토큰 발급기/검증기 및 인증 extractor
//! - [`repository`]: PostgreSQL 저장소

pub mod auth;
pub mod error;
pub mod extract;
pub mod repository;
pub mod routes;
pub mod state;

pub use auth::{
    AdminAuth, IssuedToken, JwtAuth, JwtAuthError, ManagerAuth, TokenClaims, TokenError,
    TokenIssuer, TokenValidator,
};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use extract::ApiJson;
pub use repository::PgIdentityStore;
pub use routes::*;
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
