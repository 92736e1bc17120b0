//! 통합 API 에러 응답 타입.
//!
//! 모든 엔드포인트에서 일관된 에러 형식을 제공합니다.
//!
//! - 자격증명 실패는 사유와 관계없이 `401 INVALID_CREDENTIALS`
//! - 사용자/역할 조회 실패는 항상 `404 NOT_FOUND`
//! - 본문 파싱 실패와 입력 검증 실패는 `400 VALIDATION_ERROR`
//! - 내부 에러와 토큰 서명 실패는 로그에만 상세를 남기고 `500 INTERNAL_ERROR`

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use validator::ValidationErrors;

use identity_core::IdentityError;

use crate::auth::TokenError;

/// 에러 응답 본문.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "찾을 수 없음: 사용자 bob@example.com",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "NOT_FOUND", "VALIDATION_ERROR")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 타임스탬프를 포함한 에러 생성.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// 핸들러 에러.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("사용자 이름 또는 비밀번호가 올바르지 않습니다")]
    InvalidCredentials,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            ApiError::Internal(detail) => {
                error!(detail = %detail, "Request failed with internal error");
                "내부 서버 오류가 발생했습니다".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiErrorResponse::new(code, message))).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotFound(_) => ApiError::NotFound(err.to_string()),
            IdentityError::Conflict(_) => ApiError::Conflict(err.to_string()),
            IdentityError::Validation(_) => ApiError::Validation(err.to_string()),
            IdentityError::Storage(_) | IdentityError::Internal(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;
