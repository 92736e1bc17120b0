//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/v1/users` - 로그인 / 가입
//! - `/api/v1/roles` - 역할 및 멤버십 관리

pub mod health;
pub mod roles;
pub mod users;

pub use health::{health_router, ComponentStatus, HealthResponse};
pub use roles::{
    roles_router, CreateRoleRequest, MembershipResponse, RoleDto, RolesListResponse,
    UpdateUserRoleRequest,
};
pub use users::{users_router, LoginRequest, RegisterRequest, TokenResponse, UserDto};

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/v1/users", users_router())
        .nest("/api/v1/roles", roles_router())
}

/// 상태와 공통 레이어(CORS, 트레이싱, 타임아웃)를 적용한 최종 라우터.
pub fn create_app(state: Arc<AppState>, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_api_router()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .with_state(state)
}
