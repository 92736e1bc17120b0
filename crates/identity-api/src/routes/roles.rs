//! 역할 API 라우트
//!
//! # 엔드포인트
//!
//! - `GET /api/v1/roles` - 역할 목록 (Admin)
//! - `GET /api/v1/roles/{name}` - 역할 조회 (Admin, Gerente)
//! - `POST /api/v1/roles` - 역할 생성 (인증 필요)
//! - `PUT /api/v1/roles/memberships` - 사용자 역할 추가/제거 (인증 필요)
//!
//! 역할 생성과 멤버십 변경은 역할 검사 없이 인증만 요구합니다.
//! 따라서 토큰을 가진 모든 사용자가 자신을 포함한 누구에게나 Admin을 부여할 수 있습니다.
//! 배포 시 이 경로를 신뢰된 네트워크 뒤에 두거나 `AdminAuth`로 바꿔야 합니다.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use identity_core::{Role, RoleName};

use crate::auth::{AdminAuth, JwtAuth, ManagerAuth};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

// ================================================================================================
// Request/Response Types
// ================================================================================================

/// 역할 정보
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDto {
    pub id: i64,
    pub name: String,
}

impl From<Role> for RoleDto {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name.into(),
        }
    }
}

/// 역할 목록 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct RolesListResponse {
    pub roles: Vec<RoleDto>,
    pub total: usize,
}

/// 역할 생성 요청
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, message = "역할 이름이 필요합니다"))]
    pub name: String,
}

/// 멤버십 변경 요청
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRoleRequest {
    #[validate(length(min = 1, message = "이메일이 필요합니다"))]
    pub email: String,
    pub role: String,
    /// true면 제거, false면 추가
    #[serde(default)]
    pub delete: bool,
}

/// 멤버십 변경 후 사용자의 역할
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub email: String,
    pub roles: Vec<String>,
}

// ================================================================================================
// Handlers
// ================================================================================================

/// GET /api/v1/roles - 역할 목록
async fn list_roles(
    State(state): State<Arc<AppState>>,
    AdminAuth(_claims): AdminAuth,
) -> ApiResult<Json<RolesListResponse>> {
    let roles: Vec<RoleDto> = state
        .store
        .list_roles()
        .await?
        .into_iter()
        .map(RoleDto::from)
        .collect();
    let total = roles.len();

    Ok(Json(RolesListResponse { roles, total }))
}

/// GET /api/v1/roles/{name} - 역할 조회
async fn get_role(
    State(state): State<Arc<AppState>>,
    ManagerAuth(_claims): ManagerAuth,
    Path(name): Path<String>,
) -> ApiResult<Json<RoleDto>> {
    let name = RoleName::parse(&name)?;
    let role = state
        .store
        .find_role(&name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("역할을 찾을 수 없습니다: {}", name)))?;

    Ok(Json(RoleDto::from(role)))
}

/// POST /api/v1/roles - 역할 생성
async fn create_role(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    ApiJson(request): ApiJson<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleDto>)> {
    request.validate()?;
    let name = RoleName::parse(&request.name)?;

    let role = state.store.create_role(&name).await?;
    info!(role = %role.name, by = %claims.sub, "Role created");

    Ok((StatusCode::CREATED, Json(RoleDto::from(role))))
}

/// PUT /api/v1/roles/memberships - 사용자 역할 추가/제거
async fn update_user_role(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    ApiJson(request): ApiJson<UpdateUserRoleRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    request.validate()?;
    let role = RoleName::parse(&request.role)?;

    let identity = state
        .store
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("사용자를 찾을 수 없습니다: {}", request.email))
        })?;

    if request.delete {
        state.store.remove_role_membership(&identity, &role).await?;
    } else {
        state.store.add_role_membership(&identity, &role).await?;
    }

    info!(
        user_id = identity.id,
        role = %role,
        removed = request.delete,
        by = %claims.sub,
        "Role membership updated"
    );

    let roles = state
        .store
        .roles_of(&identity)
        .await?
        .into_iter()
        .map(String::from)
        .collect();

    Ok(Json(MembershipResponse {
        email: identity.email,
        roles,
    }))
}

/// 역할 라우터 생성.
pub fn roles_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/memberships", put(update_user_role))
        .route("/{name}", get(get_role))
}
