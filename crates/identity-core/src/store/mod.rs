//! 자격증명 검증기 및 아이덴티티/역할 저장소 추상화.
//!
//! HTTP 계층과 토큰 발급기는 이 trait들에만 의존하므로,
//! 인메모리 구현([`InMemoryIdentityStore`])으로 영속 저장소 없이 테스트할 수 있습니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! let store: Arc<dyn IdentityStore> = Arc::new(InMemoryIdentityStore::default());
//!
//! if let Some(identity) = store.verify_credential("alice", "secret").await? {
//!     let roles = store.roles_of(&identity).await?;
//! }
//! ```

mod memory;

pub use memory::InMemoryIdentityStore;

use async_trait::async_trait;

use crate::domain::{Identity, NewIdentity, Role, RoleName};
use crate::error::IdentityResult;

/// 사용자 이름/비밀번호 검증기.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// 자격증명을 검증합니다.
    ///
    /// 알 수 없는 사용자와 잘못된 비밀번호는 모두 `Ok(None)`입니다.
    /// `Err`는 저장소 장애처럼 검증 자체를 수행할 수 없는 경우에만 반환됩니다.
    async fn verify_credential(
        &self,
        user_name: &str,
        password: &str,
    ) -> IdentityResult<Option<Identity>>;
}

/// 사용자 및 역할 멤버십 저장소.
#[async_trait]
pub trait IdentityStore: CredentialVerifier {
    /// 비밀번호 정책을 확인하고 해싱한 뒤 사용자를 생성합니다.
    ///
    /// 같은 사용자 이름(대소문자 무시)이 있으면 `Conflict`.
    async fn create_identity(&self, new: NewIdentity, password: &str) -> IdentityResult<Identity>;

    /// 사용자 이름으로 조회 (대소문자 무시).
    async fn find_by_name(&self, user_name: &str) -> IdentityResult<Option<Identity>>;

    /// 이메일로 조회 (대소문자 무시).
    async fn find_by_email(&self, email: &str) -> IdentityResult<Option<Identity>>;

    /// 사용자의 현재 역할 목록. 순서는 저장소 기준으로 안정적입니다.
    async fn roles_of(&self, identity: &Identity) -> IdentityResult<Vec<RoleName>>;

    /// 역할 생성. 이미 있으면 `Conflict`.
    async fn create_role(&self, name: &RoleName) -> IdentityResult<Role>;

    /// 역할 조회 (대소문자 무시).
    async fn find_role(&self, name: &RoleName) -> IdentityResult<Option<Role>>;

    /// 전체 역할 목록 (이름순).
    async fn list_roles(&self) -> IdentityResult<Vec<Role>>;

    /// 역할 멤버십 추가. 역할이 없으면 `NotFound`, 이미 멤버면 아무 일도 하지 않습니다.
    async fn add_role_membership(&self, identity: &Identity, role: &RoleName)
        -> IdentityResult<()>;

    /// 역할 멤버십 제거. 역할이 없으면 `NotFound`, 멤버가 아니면 아무 일도 하지 않습니다.
    async fn remove_role_membership(
        &self,
        identity: &Identity,
        role: &RoleName,
    ) -> IdentityResult<()>;

    /// 저장소 연결 상태 확인.
    async fn ping(&self) -> bool {
        true
    }

    /// 역할이 없으면 생성합니다.
    async fn ensure_role(&self, name: &RoleName) -> IdentityResult<Role> {
        match self.find_role(name).await? {
            Some(role) => Ok(role),
            None => self.create_role(name).await,
        }
    }
}
