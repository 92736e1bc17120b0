//! 토큰에 실리는 클레임.
//!
//! 클레임은 저장되지 않고, 발급 시점의 역할 멤버십으로부터 매번 다시 계산됩니다.
//! 발급 이후 회수된 역할은 이미 발급된 토큰이 만료될 때까지 유효하게 남습니다.

use serde::{Deserialize, Serialize};

use super::identity::Identity;

/// 클레임 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimType {
    /// 사용자 ID
    NameIdentifier,
    /// 사용자 이름
    Name,
    /// 역할 멤버십
    Role,
}

impl ClaimType {
    /// 토큰 페이로드 키.
    pub fn key(&self) -> &'static str {
        match self {
            ClaimType::NameIdentifier => "sub",
            ClaimType::Name => "unique_name",
            ClaimType::Role => "role",
        }
    }
}

/// 단일 클레임.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claim {
    pub claim_type: ClaimType,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: ClaimType, value: impl Into<String>) -> Self {
        Self {
            claim_type,
            value: value.into(),
        }
    }
}

/// 발급 대상 클레임 집합.
///
/// 순서: subject, 이름, 그 다음 저장소가 반환한 순서의 역할.
/// 중복 역할은 처음 나온 것만 남깁니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    subject: String,
    name: String,
    roles: Vec<String>,
}

impl ClaimSet {
    /// 클레임 집합 생성.
    pub fn new<I, R>(subject: impl Into<String>, name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for role in roles {
            let role = role.as_ref();
            if !unique.iter().any(|r| r == role) {
                unique.push(role.to_string());
            }
        }

        Self {
            subject: subject.into(),
            name: name.into(),
            roles: unique,
        }
    }

    /// 사용자와 현재 역할 목록으로부터 생성.
    pub fn for_identity<I, R>(identity: &Identity, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<str>,
    {
        Self::new(identity.subject(), identity.user_name.clone(), roles)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// 역할 보유 여부 (정확히 일치).
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// 발급 순서대로 펼친 클레임 목록.
    pub fn claims(&self) -> Vec<Claim> {
        let mut claims = Vec::with_capacity(self.roles.len() + 2);
        claims.push(Claim::new(ClaimType::NameIdentifier, &self.subject));
        claims.push(Claim::new(ClaimType::Name, &self.name));
        claims.extend(
            self.roles
                .iter()
                .map(|role| Claim::new(ClaimType::Role, role)),
        );
        claims
    }
}
