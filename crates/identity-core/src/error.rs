//! 아이덴티티 시스템의 에러 타입.
//!
//! 저장소, 검증, 조회 실패 등 게이트웨이 전반에서 사용되는 에러를 정의합니다.
//! 자격증명 검증 실패는 에러가 아니라 `None`으로 표현됩니다
//! (알 수 없는 사용자와 잘못된 비밀번호를 구분하지 않기 위함).

use thiserror::Error;

/// 핵심 아이덴티티 에러.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// 사용자 또는 역할을 찾을 수 없음
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 이미 존재하는 사용자 이름 / 역할 이름
    #[error("이미 존재함: {0}")]
    Conflict(String),

    /// 잘못된 입력 (비밀번호 정책 위반 포함)
    #[error("잘못된 입력: {0}")]
    Validation(String),

    /// 저장소 접근 에러
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 아이덴티티 작업을 위한 Result 타입.
pub type IdentityResult<T> = Result<T, IdentityError>;

impl IdentityError {
    /// 조회 실패 에러인지 확인합니다.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IdentityError::NotFound(_))
    }

    /// 클라이언트 입력이 원인인 에러인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IdentityError::NotFound(_) | IdentityError::Conflict(_) | IdentityError::Validation(_)
        )
    }
}

impl From<crate::password::PasswordError> for IdentityError {
    fn from(err: crate::password::PasswordError) -> Self {
        IdentityError::Internal(err.to_string())
    }
}
