//! 인증 및 권한 부여.
//!
//! JWT 기반 인증 및 역할 기반 접근 제어를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`TokenIssuer`]: 검증된 사용자에게 HS512 서명 토큰 발급
//! - [`TokenValidator`]: 서명/만료 검증 및 클레임 추출
//! - [`JwtAuth`], [`AdminAuth`], [`ManagerAuth`]: Axum 추출기
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn protected_handler(JwtAuth(claims): JwtAuth) -> impl IntoResponse {
//!     format!("Hello, {}!", claims.unique_name)
//! }
//! ```

mod jwt;
mod middleware;

pub use jwt::{
    IssuedToken, TokenClaims, TokenError, TokenIssuer, TokenValidator, SIGNING_ALGORITHM,
    TOKEN_LIFETIME_SECS,
};
pub use middleware::{require_any_role, AdminAuth, JwtAuth, JwtAuthError, ManagerAuth};
