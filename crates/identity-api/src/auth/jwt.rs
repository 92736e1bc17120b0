//! JWT 토큰 발급 및 검증.
//!
//! 발급기는 시작 시 주입된 대칭 키로 HS512 서명된 compact JWS를 만듭니다.
//! 만료는 발급 시각 + 24시간으로 고정이며, 갱신/폐기 토큰은 없습니다.
//! 키를 교체하면 기존 토큰은 모두 검증에 실패합니다.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;

use identity_core::{ClaimSet, ConfigurationError, Identity, RoleName};

/// 토큰 유효 기간 (초).
pub const TOKEN_LIFETIME_SECS: i64 = 86_400;

/// 서명 알고리즘.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS512;

/// 이보다 짧은 키는 경고만 남깁니다 (HS512 블록 크기 기준 권장값).
const RECOMMENDED_SECRET_LEN: usize = 64;

/// JWT 페이로드.
///
/// 키 이름은 표준 라이브러리들이 그대로 읽을 수 있는 형태를 따릅니다.
/// `role`은 역할이 하나면 문자열, 여러 개면 배열로 직렬화되고, 없으면 생략됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject - 사용자 ID
    pub sub: String,
    /// 사용자 이름
    pub unique_name: String,
    /// 역할 목록
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "one_or_many")]
    pub role: Vec<String>,
    /// Not Before
    pub nbf: i64,
    /// Expiration
    pub exp: i64,
    /// Issued At
    pub iat: i64,
}

impl TokenClaims {
    /// 클레임 집합과 발급 시각으로 페이로드 생성.
    pub fn new(claims: &ClaimSet, issued_at: DateTime<Utc>) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: claims.subject().to_string(),
            unique_name: claims.name().to_string(),
            role: claims.roles().to_vec(),
            nbf: iat,
            exp: iat + TOKEN_LIFETIME_SECS,
            iat,
        }
    }

    /// 페이로드의 아이덴티티 클레임 집합.
    pub fn claim_set(&self) -> ClaimSet {
        ClaimSet::new(self.sub.clone(), self.unique_name.clone(), &self.role)
    }

    /// 특정 역할 보유 여부.
    pub fn has_role(&self, role: &str) -> bool {
        self.role.iter().any(|r| r == role)
    }

    /// 주어진 역할 중 하나라도 보유하는지 확인.
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }

    /// 만료 시각.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// 발급된 토큰.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    /// compact JWS 문자열
    pub token: String,
    /// 발급 시각
    pub issued_at: DateTime<Utc>,
    /// 만료 시각
    pub expires_at: DateTime<Utc>,
}

/// 토큰 발급/검증 에러.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("토큰 서명 실패: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("토큰이 만료되었습니다")]
    Expired,
    #[error("토큰이 아직 유효하지 않습니다")]
    NotYetValid,
    #[error("토큰 서명이 일치하지 않습니다")]
    InvalidSignature,
    #[error("허용되지 않은 서명 알고리즘")]
    InvalidAlgorithm,
    #[error("잘못된 토큰 형식: {0}")]
    Malformed(String),
}

impl TokenError {
    /// 클라이언트가 제시한 토큰의 문제인지 (서버 측 실패가 아닌지) 확인.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, TokenError::Configuration(_) | TokenError::Signing(_))
    }
}

fn secret_bytes(secret: &SecretString) -> Result<&[u8], TokenError> {
    let secret = secret.expose_secret();
    if secret.trim().is_empty() {
        return Err(ConfigurationError::MissingSigningKey.into());
    }
    Ok(secret.as_bytes())
}

/// 토큰 발급기.
///
/// 서명 키로부터 파생된 불변 키만 보관하므로 여러 요청에서 잠금 없이 공유됩니다.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    header: Header,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &self.header.alg)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// 서명 키로 발급기 생성.
    ///
    /// 키가 비어 있으면 `ConfigurationError::MissingSigningKey`.
    pub fn new(secret: &SecretString) -> Result<Self, TokenError> {
        let bytes = secret_bytes(secret)?;
        if bytes.len() < RECOMMENDED_SECRET_LEN {
            warn!(
                length = bytes.len(),
                recommended = RECOMMENDED_SECRET_LEN,
                "Token signing secret is shorter than recommended"
            );
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(bytes),
            header: Header::new(SIGNING_ALGORITHM),
        })
    }

    /// 현재 시각 기준으로 토큰 발급.
    pub fn issue(&self, claims: &ClaimSet) -> Result<IssuedToken, TokenError> {
        self.issue_at(claims, Utc::now())
    }

    /// 사용자와 현재 역할 목록으로 토큰 발급.
    pub fn issue_for(
        &self,
        identity: &Identity,
        roles: &[RoleName],
    ) -> Result<IssuedToken, TokenError> {
        self.issue(&ClaimSet::for_identity(identity, roles))
    }

    /// 지정한 시각을 발급 시각으로 토큰 발급.
    pub fn issue_at(
        &self,
        claims: &ClaimSet,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        // 초 단위로 절삭하여 페이로드의 iat/exp와 일치시킴
        let issued_at = Utc
            .timestamp_opt(now.timestamp(), 0)
            .single()
            .unwrap_or(now);
        let payload = TokenClaims::new(claims, issued_at);

        let token =
            encode(&self.header, &payload, &self.encoding_key).map_err(TokenError::Signing)?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at: issued_at + Duration::seconds(TOKEN_LIFETIME_SECS),
        })
    }
}

/// 토큰 검증기.
///
/// 서명(HS512만 허용)과 만료를 각각 독립적으로 확인합니다.
#[derive(Clone)]
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

impl TokenValidator {
    /// 서명 키와 허용 시계 오차(초)로 검증기 생성.
    pub fn new(secret: &SecretString, leeway_secs: u64) -> Result<Self, TokenError> {
        let bytes = secret_bytes(secret)?;

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = leeway_secs;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            decoding_key: DecodingKey::from_secret(bytes),
            validation,
        })
    }

    /// 토큰 디코딩 및 검증.
    pub fn validate(&self, token: &str) -> Result<TokenClaims, TokenError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::ImmatureSignature => TokenError::NotYetValid,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => TokenError::InvalidAlgorithm,
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}

/// 단일 값이면 문자열, 여러 값이면 배열.
mod one_or_many {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    pub fn serialize<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        match values {
            [single] => single.serialize(serializer),
            many => many.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        })
    }
}
