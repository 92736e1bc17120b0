//! 사용자 아이덴티티.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, IdentityResult};

/// 저장소가 부여하는 사용자 ID.
pub type IdentityId = i64;

/// 대소문자 구분 없는 고유성 비교용 정규화 (공백 제거 후 대문자).
pub fn normalize_key(value: &str) -> String {
    value.trim().to_uppercase()
}

/// 등록된 사용자.
///
/// 비밀번호 해시는 저장소 내부에만 존재하며 이 구조체에 포함되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// 사용자 ID
    pub id: IdentityId,
    /// 로그인 이름 (대소문자 무시 고유)
    pub user_name: String,
    /// 이메일
    pub email: String,
    /// 표시 이름
    pub display_name: String,
    /// 가입 시각
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// 토큰 subject로 사용되는 문자열 ID.
    pub fn subject(&self) -> String {
        self.id.to_string()
    }
}

/// 가입 요청으로 생성할 사용자 정보.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub user_name: String,
    pub email: String,
    pub display_name: String,
}

impl NewIdentity {
    /// 새 사용자 정보 생성.
    ///
    /// 이메일이 비어 있으면 사용자 이름을 이메일로 사용합니다.
    pub fn new(
        user_name: impl Into<String>,
        email: Option<String>,
        display_name: impl Into<String>,
    ) -> Self {
        let user_name = user_name.into().trim().to_string();
        let email = email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| user_name.clone());

        Self {
            user_name,
            email,
            display_name: display_name.into(),
        }
    }

    /// 저장 전 필수 필드 확인.
    pub fn validate(&self) -> IdentityResult<()> {
        if self.user_name.is_empty() {
            return Err(IdentityError::Validation(
                "사용자 이름이 비어 있습니다".to_string(),
            ));
        }
        if self.email.is_empty() {
            return Err(IdentityError::Validation("이메일이 비어 있습니다".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_defaults_to_user_name() {
        let new = NewIdentity::new("alice@example.com", None, "Alice");
        assert_eq!(new.email, "alice@example.com");

        let new = NewIdentity::new("alice", Some("  ".to_string()), "Alice");
        assert_eq!(new.email, "alice");

        let new = NewIdentity::new("alice", Some("a@b.c".to_string()), "Alice");
        assert_eq!(new.email, "a@b.c");
    }

    #[test]
    fn test_validate_rejects_blank_user_name() {
        let new = NewIdentity::new("   ", Some("a@b.c".to_string()), "");
        assert!(matches!(new.validate(), Err(IdentityError::Validation(_))));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key(" Alice "), "ALICE");
        assert_eq!(normalize_key("gerente"), normalize_key("Gerente"));
    }
}
