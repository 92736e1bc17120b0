//! 역할 및 역할 이름.

use serde::{Deserialize, Serialize};

use super::identity::normalize_key;
use crate::error::{IdentityError, IdentityResult};

/// 관리자 역할 이름.
pub const ADMIN_ROLE: &str = "Admin";

/// 매니저 역할 이름.
pub const MANAGER_ROLE: &str = "Gerente";

/// 검증된 역할 이름.
///
/// 앞뒤 공백이 제거되고 비어 있지 않음이 보장됩니다.
/// 저장소 고유성 비교는 [`RoleName::normalized`] 기준입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    /// 문자열에서 역할 이름 파싱.
    pub fn parse(value: impl AsRef<str>) -> IdentityResult<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Validation(
                "역할 이름이 비어 있습니다".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// 원래 표기.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 대소문자 무시 비교용 키.
    pub fn normalized(&self) -> String {
        normalize_key(&self.0)
    }
}

impl AsRef<str> for RoleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoleName {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<RoleName> for String {
    fn from(value: RoleName) -> Self {
        value.0
    }
}

/// 저장된 역할.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: RoleName,
}
