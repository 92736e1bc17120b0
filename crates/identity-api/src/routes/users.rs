//! 사용자 API 라우트
//!
//! # 엔드포인트
//!
//! - `POST /api/v1/users/login` - 로그인 후 토큰 발급
//! - `POST /api/v1/users/register` - 가입 후 토큰 발급
//!
//! 두 엔드포인트 모두 익명 접근을 허용합니다.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use identity_core::{Identity, NewIdentity};

use crate::auth::IssuedToken;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

// ================================================================================================
// Request/Response Types
// ================================================================================================

/// 로그인 요청
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "사용자 이름이 필요합니다"))]
    pub user_name: String,
    #[validate(length(min = 1, message = "비밀번호가 필요합니다"))]
    pub password: String,
}

/// 가입 요청
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "사용자 이름이 필요합니다"))]
    pub user_name: String,
    /// 생략 시 사용자 이름을 이메일로 사용
    #[serde(default)]
    #[validate(email(message = "이메일 형식이 올바르지 않습니다"))]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: String,
    pub password: String,
    #[validate(must_match(other = "password", message = "비밀번호 확인이 일치하지 않습니다"))]
    pub confirm_password: String,
}

/// 사용자 정보 (비밀번호 제외)
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub user_name: String,
    pub email: String,
    pub full_name: String,
}

impl From<&Identity> for UserDto {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            user_name: identity.user_name.clone(),
            email: identity.email.clone(),
            full_name: identity.display_name.clone(),
        }
    }
}

/// 토큰 응답
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserDto,
}

impl TokenResponse {
    fn new(issued: IssuedToken, identity: &Identity) -> Self {
        Self {
            token: issued.token,
            token_type: "Bearer".to_string(),
            expires_at: issued.expires_at,
            user: UserDto::from(identity),
        }
    }
}

// ================================================================================================
// Handlers
// ================================================================================================

/// 역할을 현재 멤버십에서 다시 읽어 토큰을 발급합니다.
async fn issue_token(state: &AppState, identity: &Identity) -> ApiResult<TokenResponse> {
    let roles = state.store.roles_of(identity).await?;
    let issued = state.issuer.issue_for(identity, &roles)?;
    Ok(TokenResponse::new(issued, identity))
}

/// POST /api/v1/users/login - 로그인
async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    request.validate()?;

    let identity = state
        .store
        .verify_credential(&request.user_name, &request.password)
        .await?
        .ok_or_else(|| {
            warn!(user_name = %request.user_name, "Login failed");
            ApiError::InvalidCredentials
        })?;

    let response = issue_token(&state, &identity).await?;
    info!(user_id = identity.id, "User logged in");

    Ok(Json(response))
}

/// POST /api/v1/users/register - 가입
async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    request.validate()?;

    let new = NewIdentity::new(request.user_name, request.email, request.full_name);
    let identity = state.store.create_identity(new, &request.password).await?;
    info!(user_id = identity.id, user_name = %identity.user_name, "User registered");

    let response = issue_token(&state, &identity).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// 사용자 라우터 생성.
pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
}
