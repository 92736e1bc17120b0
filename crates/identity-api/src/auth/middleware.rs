//! Axum용 JWT 인증 추출기.
//!
//! 검증 키는 전역 변수가 아니라 [`AppState`]에 주입된 [`TokenValidator`]에서 가져옵니다.
//!
//! [`TokenValidator`]: super::TokenValidator

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use identity_core::{ADMIN_ROLE, MANAGER_ROLE};

use super::{TokenClaims, TokenError};
use crate::state::AppState;

/// JWT 인증 추출기.
///
/// # 사용 예시
///
/// ```rust,ignore
/// async fn protected_handler(JwtAuth(claims): JwtAuth) -> impl IntoResponse {
///     format!("Authenticated user: {}", claims.unique_name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JwtAuth(pub TokenClaims);

/// JWT 인증 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtAuthError {
    #[error("인증 토큰이 필요합니다")]
    MissingToken,
    #[error("잘못된 Authorization 헤더 형식")]
    InvalidAuthHeader,
    #[error("토큰이 만료되었습니다")]
    TokenExpired,
    #[error("유효하지 않은 토큰")]
    InvalidToken,
    #[error("권한이 부족합니다")]
    InsufficientPermission,
}

impl IntoResponse for JwtAuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            JwtAuthError::MissingToken => (StatusCode::UNAUTHORIZED, "MISSING_TOKEN"),
            JwtAuthError::InvalidAuthHeader => (StatusCode::UNAUTHORIZED, "INVALID_AUTH_HEADER"),
            JwtAuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            JwtAuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            JwtAuthError::InsufficientPermission => {
                (StatusCode::FORBIDDEN, "INSUFFICIENT_PERMISSION")
            }
        };

        let body = Json(json!({
            "code": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Authorization 헤더에서 Bearer 토큰을 꺼냅니다.
fn bearer_token(parts: &Parts) -> Result<&str, JwtAuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(JwtAuthError::MissingToken)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(JwtAuthError::InvalidAuthHeader)
}

impl FromRequestParts<Arc<AppState>> for JwtAuth {
    type Rejection = JwtAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let claims = state.validator.validate(token).map_err(|e| {
            debug!(error = %e, "Bearer token rejected");
            match e {
                TokenError::Expired => JwtAuthError::TokenExpired,
                _ => JwtAuthError::InvalidToken,
            }
        })?;

        Ok(JwtAuth(claims))
    }
}

/// 주어진 역할 중 하나 이상을 요구합니다.
pub fn require_any_role(roles: &[&str], claims: &TokenClaims) -> Result<(), JwtAuthError> {
    if claims.has_any_role(roles) {
        Ok(())
    } else {
        Err(JwtAuthError::InsufficientPermission)
    }
}

/// Admin 역할을 요구하는 추출기.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub TokenClaims);

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = JwtAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let JwtAuth(claims) = JwtAuth::from_request_parts(parts, state).await?;
        require_any_role(&[ADMIN_ROLE], &claims)?;
        Ok(AdminAuth(claims))
    }
}

/// Admin 또는 Gerente 역할을 요구하는 추출기.
#[derive(Debug, Clone)]
pub struct ManagerAuth(pub TokenClaims);

impl FromRequestParts<Arc<AppState>> for ManagerAuth {
    type Rejection = JwtAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let JwtAuth(claims) = JwtAuth::from_request_parts(parts, state).await?;
        require_any_role(&[ADMIN_ROLE, MANAGER_ROLE], &claims)?;
        Ok(ManagerAuth(claims))
    }
}
