//! 영속 저장소 구현.
//!
//! 데이터베이스 접근 로직을 라우트 핸들러에서 분리하여 관리합니다.
//! 핸들러는 [`identity_core::IdentityStore`] trait만 사용합니다.

pub mod identities;

pub use identities::PgIdentityStore;
