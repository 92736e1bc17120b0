//! 비밀번호 해싱 및 정책.
//!
//! Argon2 기반 비밀번호 해싱/검증과 가입 시 적용되는 비밀번호 정책.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// 존재하지 않는 사용자 검증에 쓰는 해시. 실제 해시와 같은 Argon2 파라미터로 한 번만 계산됩니다.
static DECOY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("decoy-credential").ok());

/// 비밀번호 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
    #[error("비밀번호 검증 실패")]
    VerificationFailed,
    #[error("잘못된 해시 형식")]
    InvalidHashFormat,
}

/// 비밀번호 해싱.
///
/// Argon2id 알고리즘을 사용하며 솔트는 자동으로 생성됩니다.
///
/// # Returns
///
/// PHC 형식의 해시 문자열 (솔트 포함)
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| PasswordError::HashingFailed)?;

    Ok(hash.to_string())
}

/// 비밀번호 검증.
///
/// 비밀번호가 일치하면 Ok(()), 불일치하면 Err
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::VerificationFailed)
}

/// 저장된 해시(사용자가 없으면 더미 해시)로 비밀번호를 검증합니다.
///
/// 사용자가 없어도 같은 Argon2 검증 비용을 치르므로 응답 시간으로 사용자 존재 여부를 구분할 수 없습니다.
/// `hash`가 `None`이면 항상 `false`입니다.
pub fn verify_password_or_decoy(password: &str, hash: Option<&str>) -> bool {
    match hash {
        Some(hash) => verify_password(password, hash).is_ok(),
        None => {
            if let Some(decoy) = DECOY_HASH.as_deref() {
                let _ = verify_password(password, decoy);
            }
            false
        }
    }
}

/// 더미 해시를 미리 계산합니다. 첫 번째 미존재 사용자 로그인만 느려지는 것을 막습니다.
pub fn prepare_decoy_hash() {
    Lazy::force(&DECOY_HASH);
}

/// 가입 시 적용되는 비밀번호 정책.
///
/// 기본값은 최소 4자, 문자 종류 요구사항 없음.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PasswordPolicy {
    /// 최소 길이 (문자 수)
    pub required_length: usize,
    /// 숫자 포함 필요
    pub require_digit: bool,
    /// 소문자 포함 필요
    pub require_lowercase: bool,
    /// 대문자 포함 필요
    pub require_uppercase: bool,
    /// 영숫자가 아닌 문자 포함 필요
    pub require_non_alphanumeric: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            required_length: 4,
            require_digit: false,
            require_lowercase: false,
            require_uppercase: false,
            require_non_alphanumeric: false,
        }
    }
}

impl PasswordPolicy {
    /// 정책 검증.
    ///
    /// 위반한 첫 번째 규칙의 설명을 반환합니다.
    pub fn validate(&self, password: &str) -> Result<(), &'static str> {
        if password.chars().count() < self.required_length {
            return Err("비밀번호가 최소 길이보다 짧습니다");
        }

        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err("비밀번호에 최소 1개의 숫자가 포함되어야 합니다");
        }

        if self.require_lowercase && !password.chars().any(char::is_lowercase) {
            return Err("비밀번호에 최소 1개의 소문자가 포함되어야 합니다");
        }

        if self.require_uppercase && !password.chars().any(char::is_uppercase) {
            return Err("비밀번호에 최소 1개의 대문자가 포함되어야 합니다");
        }

        if self.require_non_alphanumeric && password.chars().all(char::is_alphanumeric) {
            return Err("비밀번호에 최소 1개의 특수문자가 포함되어야 합니다");
        }

        Ok(())
    }
}
