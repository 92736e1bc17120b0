//! 인메모리 아이덴티티 저장소.
//!
//! 테스트 대역 및 데이터베이스가 설정되지 않은 개발 환경용.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{CredentialVerifier, IdentityStore};
use crate::domain::{normalize_key, Identity, IdentityId, NewIdentity, Role, RoleName};
use crate::error::{IdentityError, IdentityResult};
use crate::password::{
    hash_password, prepare_decoy_hash, verify_password_or_decoy, PasswordPolicy,
};

#[derive(Debug)]
struct StoredIdentity {
    identity: Identity,
    normalized_name: String,
    normalized_email: String,
    password_hash: String,
}

#[derive(Debug, Default)]
struct Inner {
    identities: Vec<StoredIdentity>,
    roles: Vec<Role>,
    /// (사용자 ID, 역할 ID), 추가 순서 유지
    memberships: Vec<(IdentityId, i64)>,
    next_identity_id: IdentityId,
    next_role_id: i64,
}

impl Inner {
    fn role_by_name(&self, name: &RoleName) -> Option<&Role> {
        let key = name.normalized();
        self.roles.iter().find(|r| r.name.normalized() == key)
    }

    fn require_identity(&self, id: IdentityId) -> IdentityResult<()> {
        if self.identities.iter().any(|s| s.identity.id == id) {
            Ok(())
        } else {
            Err(IdentityError::NotFound(format!("사용자 {}", id)))
        }
    }
}

/// `tokio::sync::RwLock` 기반 인메모리 저장소.
#[derive(Debug)]
pub struct InMemoryIdentityStore {
    inner: RwLock<Inner>,
    policy: PasswordPolicy,
}

impl InMemoryIdentityStore {
    /// 비밀번호 정책을 지정하여 생성.
    pub fn new(policy: PasswordPolicy) -> Self {
        prepare_decoy_hash();
        Self {
            inner: RwLock::new(Inner::default()),
            policy,
        }
    }

    /// 저장된 사용자 수.
    pub async fn identity_count(&self) -> usize {
        self.inner.read().await.identities.len()
    }
}

impl Default for InMemoryIdentityStore {
    fn default() -> Self {
        Self::new(PasswordPolicy::default())
    }
}

#[async_trait]
impl CredentialVerifier for InMemoryIdentityStore {
    async fn verify_credential(
        &self,
        user_name: &str,
        password: &str,
    ) -> IdentityResult<Option<Identity>> {
        let key = normalize_key(user_name);
        let found = {
            let inner = self.inner.read().await;
            inner
                .identities
                .iter()
                .find(|s| s.normalized_name == key)
                .map(|s| (s.identity.clone(), s.password_hash.clone()))
        };

        let (identity, hash) = found.unzip();
        if identity.is_none() {
            debug!("Credential check for unknown user");
        }

        // 사용자 유무와 관계없이 Argon2 검증 1회 (블로킹 풀)
        let password = password.to_string();
        let matched = tokio::task::spawn_blocking(move || {
            verify_password_or_decoy(&password, hash.as_deref())
        })
        .await
        .map_err(|e| IdentityError::Internal(e.to_string()))?;

        Ok(identity.filter(|_| matched))
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn create_identity(&self, new: NewIdentity, password: &str) -> IdentityResult<Identity> {
        new.validate()?;
        self.policy
            .validate(password)
            .map_err(|msg| IdentityError::Validation(msg.to_string()))?;

        // 해싱은 잠금 밖, 블로킹 풀에서 수행
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| IdentityError::Internal(e.to_string()))??;
        let normalized_name = normalize_key(&new.user_name);
        let normalized_email = normalize_key(&new.email);

        let mut inner = self.inner.write().await;
        if inner
            .identities
            .iter()
            .any(|s| s.normalized_name == normalized_name)
        {
            return Err(IdentityError::Conflict(new.user_name));
        }
        if inner
            .identities
            .iter()
            .any(|s| s.normalized_email == normalized_email)
        {
            return Err(IdentityError::Conflict(new.email));
        }

        inner.next_identity_id += 1;
        let identity = Identity {
            id: inner.next_identity_id,
            user_name: new.user_name,
            email: new.email,
            display_name: new.display_name,
            created_at: Utc::now(),
        };

        inner.identities.push(StoredIdentity {
            identity: identity.clone(),
            normalized_email,
            normalized_name,
            password_hash,
        });

        Ok(identity)
    }

    async fn find_by_name(&self, user_name: &str) -> IdentityResult<Option<Identity>> {
        let key = normalize_key(user_name);
        let inner = self.inner.read().await;
        Ok(inner
            .identities
            .iter()
            .find(|s| s.normalized_name == key)
            .map(|s| s.identity.clone()))
    }

    async fn find_by_email(&self, email: &str) -> IdentityResult<Option<Identity>> {
        let key = normalize_key(email);
        let inner = self.inner.read().await;
        Ok(inner
            .identities
            .iter()
            .find(|s| s.normalized_email == key)
            .map(|s| s.identity.clone()))
    }

    async fn roles_of(&self, identity: &Identity) -> IdentityResult<Vec<RoleName>> {
        let inner = self.inner.read().await;
        let roles = inner
            .memberships
            .iter()
            .filter(|(user_id, _)| *user_id == identity.id)
            .filter_map(|(_, role_id)| inner.roles.iter().find(|r| r.id == *role_id))
            .map(|r| r.name.clone())
            .collect();
        Ok(roles)
    }

    async fn create_role(&self, name: &RoleName) -> IdentityResult<Role> {
        let mut inner = self.inner.write().await;
        if inner.role_by_name(name).is_some() {
            return Err(IdentityError::Conflict(name.to_string()));
        }

        inner.next_role_id += 1;
        let role = Role {
            id: inner.next_role_id,
            name: name.clone(),
        };
        inner.roles.push(role.clone());
        Ok(role)
    }

    async fn find_role(&self, name: &RoleName) -> IdentityResult<Option<Role>> {
        Ok(self.inner.read().await.role_by_name(name).cloned())
    }

    async fn list_roles(&self) -> IdentityResult<Vec<Role>> {
        let mut roles = self.inner.read().await.roles.clone();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn add_role_membership(
        &self,
        identity: &Identity,
        role: &RoleName,
    ) -> IdentityResult<()> {
        let mut inner = self.inner.write().await;
        inner.require_identity(identity.id)?;
        let role_id = inner
            .role_by_name(role)
            .map(|r| r.id)
            .ok_or_else(|| IdentityError::NotFound(format!("역할 {}", role)))?;

        if !inner.memberships.contains(&(identity.id, role_id)) {
            inner.memberships.push((identity.id, role_id));
        }
        Ok(())
    }

    async fn remove_role_membership(
        &self,
        identity: &Identity,
        role: &RoleName,
    ) -> IdentityResult<()> {
        let mut inner = self.inner.write().await;
        inner.require_identity(identity.id)?;
        let role_id = inner
            .role_by_name(role)
            .map(|r| r.id)
            .ok_or_else(|| IdentityError::NotFound(format!("역할 {}", role)))?;

        inner
            .memberships
            .retain(|membership| *membership != (identity.id, role_id));
        Ok(())
    }
}
