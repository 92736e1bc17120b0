//! 발급 토큰 상호운용성 테스트
//!
//! 외부 검증기가 같은 키로 HMAC-SHA512 서명을 재계산했을 때 일치하는지,
//! 그리고 페이로드가 표준 JWT 형태인지 확인합니다.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use secrecy::SecretString;
use sha2::Sha512;

use identity_api::{TokenIssuer, TokenValidator};
use identity_core::ClaimSet;

const SECRET: &str = "test-secret-key-123";

fn issuer() -> TokenIssuer {
    TokenIssuer::new(&SecretString::from(SECRET.to_string())).unwrap()
}

fn decode_segment(segment: &str) -> serde_json::Value {
    let bytes = URL_SAFE_NO_PAD.decode(segment).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[test]
fn test_signature_matches_independent_hmac_sha512() {
    let claims = ClaimSet::new("42", "alice", ["Admin", "Gerente"]);
    let issued = issuer().issue(&claims).unwrap();

    let segments: Vec<&str> = issued.token.split('.').collect();
    assert_eq!(segments.len(), 3);

    let signing_input = format!("{}.{}", segments[0], segments[1]);
    let mut mac = Hmac::<Sha512>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(signing_input.as_bytes());
    let expected = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    assert_eq!(segments[2], expected);
}

#[test]
fn test_header_and_payload_shape() {
    let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let claims = ClaimSet::new("42", "alice", ["Admin"]);
    let issued = issuer().issue_at(&claims, t0).unwrap();

    let segments: Vec<&str> = issued.token.split('.').collect();
    let header = decode_segment(segments[0]);
    assert_eq!(header["alg"], "HS512");
    assert_eq!(header["typ"], "JWT");

    let payload = decode_segment(segments[1]);
    assert_eq!(payload["sub"], "42");
    assert_eq!(payload["unique_name"], "alice");
    assert_eq!(payload["role"], "Admin");
    assert_eq!(payload["iat"], t0.timestamp());
    assert_eq!(payload["nbf"], t0.timestamp());
    assert_eq!(payload["exp"], t0.timestamp() + 86_400);
}

#[test]
fn test_tampered_payload_is_rejected() {
    let secret = SecretString::from(SECRET.to_string());
    let validator = TokenValidator::new(&secret, 0).unwrap();

    let claims = ClaimSet::new("42", "alice", Vec::<String>::new());
    let issued = issuer().issue(&claims).unwrap();
    assert!(validator.validate(&issued.token).is_ok());

    // 역할을 몰래 추가한 페이로드로 교체
    let segments: Vec<&str> = issued.token.split('.').collect();
    let mut payload = decode_segment(segments[1]);
    payload["role"] = serde_json::json!("Admin");
    let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
    let forged = format!("{}.{}.{}", segments[0], forged_payload, segments[2]);

    let err = validator.validate(&forged).unwrap_err();
    assert!(err.is_rejection());
}
