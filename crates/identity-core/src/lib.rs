//! # Identity Core
//!
//! 아이덴티티 게이트웨이의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 게이트웨이 전반에서 사용되는 기본 타입을 제공합니다:
//! - 사용자(Identity) 및 역할(Role) 모델
//! - 토큰 발급 시 파생되는 클레임 집합
//! - 자격증명 검증기 / 아이덴티티 저장소 trait 및 인메모리 구현
//! - 비밀번호 해싱 및 정책
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod password;
pub mod store;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use password::{
    hash_password, prepare_decoy_hash, verify_password, verify_password_or_decoy, PasswordError,
    PasswordPolicy,
};
pub use store::{CredentialVerifier, IdentityStore, InMemoryIdentityStore};
