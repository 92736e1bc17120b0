//! HTTP API 통합 테스트
//!
//! 인메모리 저장소로 가입, 로그인, 역할 관리 흐름을 라우터 전체에 대해 검증합니다.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use identity_api::{create_app, AppState, TokenIssuer, TokenValidator};
use identity_core::{
    ClaimSet, IdentityStore, InMemoryIdentityStore, PasswordPolicy, RoleName, ADMIN_ROLE,
    MANAGER_ROLE,
};

const SECRET: &str = "api-flow-secret-key-0123456789";

struct TestApp {
    router: Router,
    store: Arc<InMemoryIdentityStore>,
    validator: TokenValidator,
}

async fn test_app() -> TestApp {
    let secret = SecretString::from(SECRET.to_string());
    let store = Arc::new(InMemoryIdentityStore::new(PasswordPolicy::default()));
    for name in [ADMIN_ROLE, MANAGER_ROLE] {
        store.ensure_role(&RoleName::parse(name).unwrap()).await.unwrap();
    }

    let state = AppState::new(
        store.clone(),
        TokenIssuer::new(&secret).unwrap(),
        TokenValidator::new(&secret, 0).unwrap(),
    );

    TestApp {
        router: create_app(Arc::new(state), Duration::from_secs(5)),
        store,
        validator: TokenValidator::new(&secret, 0).unwrap(),
    }
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register(app: &TestApp, user_name: &str, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/v1/users/register",
        None,
        Some(json!({
            "userName": user_name,
            "email": email,
            "fullName": "Test User",
            "password": password,
            "confirmPassword": password
        })),
    )
    .await
}

async fn login(app: &TestApp, user_name: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "userName": user_name, "password": password })),
    )
    .await
}

fn token_of(body: &Value) -> String {
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_register_then_login_issues_valid_token() {
    let app = test_app().await;

    let (status, body) = register(&app, "alice", "alice@example.com", "pw1234").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["user"]["userName"], "alice");
    assert_eq!(app.store.identity_count().await, 1);

    let (status, body) = login(&app, "alice", "pw1234").await;
    assert_eq!(status, StatusCode::OK);

    let claims = app.validator.validate(&token_of(&body)).unwrap();
    assert_eq!(claims.unique_name, "alice");
    assert_eq!(claims.sub, body["user"]["id"].as_i64().unwrap().to_string());
    assert!(claims.role.is_empty());
    assert_eq!(claims.exp - claims.iat, 86_400);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = test_app().await;
    register(&app, "alice", "alice@example.com", "pw1234").await;

    let (wrong_status, wrong_body) = login(&app, "alice", "wrong-password").await;
    let (unknown_status, unknown_body) = login(&app, "nobody", "pw1234").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["code"], "INVALID_CREDENTIALS");
    assert_eq!(wrong_body["code"], unknown_body["code"]);
    assert_eq!(wrong_body["message"], unknown_body["message"]);
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let app = test_app().await;
    register(&app, "alice", "alice@example.com", "pw1234").await;

    let (status, body) = register(&app, "ALICE", "other@example.com", "pw1234").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = register(&app, "bob", "bob@example.com", "pw").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/users/register",
        None,
        Some(json!({
            "userName": "carol",
            "password": "pw1234",
            "confirmPassword": "pw9999"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.identity_count().await, 1);
}

#[tokio::test]
async fn test_role_endpoints_require_token() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/roles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "MISSING_TOKEN");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/roles",
        Some("not-a-token"),
        Some(json!({ "name": "Auditor" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = test_app().await;
    let issuer = TokenIssuer::new(&SecretString::from(SECRET.to_string())).unwrap();
    let stale = issuer
        .issue_at(
            &ClaimSet::new("1", "alice", [ADMIN_ROLE]),
            Utc::now() - chrono::Duration::days(2),
        )
        .unwrap();

    let (status, body) = send(&app, Method::GET, "/api/v1/roles", Some(&stale.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_role_membership_flow() {
    let app = test_app().await;
    let (_, body) = register(&app, "alice", "alice@example.com", "pw1234").await;
    let plain_token = token_of(&body);

    // 역할 없는 사용자는 목록 조회 불가
    let (status, body) = send(&app, Method::GET, "/api/v1/roles", Some(&plain_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INSUFFICIENT_PERMISSION");

    // 인증된 사용자는 역할 생성 가능
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/roles",
        Some(&plain_token),
        Some(json!({ "name": "Auditor" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Auditor");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/roles",
        Some(&plain_token),
        Some(json!({ "name": "auditor" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Admin 멤버십 추가 (두 번 추가해도 한 번만 반영)
    for _ in 0..2 {
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/v1/roles/memberships",
            Some(&plain_token),
            Some(json!({ "email": "ALICE@example.com", "role": ADMIN_ROLE })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roles"], json!([ADMIN_ROLE]));
    }

    // 기존 토큰의 클레임은 발급 시점 기준
    let (status, _) = send(&app, Method::GET, "/api/v1/roles", Some(&plain_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 재로그인하면 새 역할이 반영됨
    let (_, body) = login(&app, "alice", "pw1234").await;
    let admin_token = token_of(&body);
    let claims = app.validator.validate(&admin_token).unwrap();
    assert_eq!(claims.role, vec![ADMIN_ROLE.to_string()]);

    let (status, body) = send(&app, Method::GET, "/api/v1/roles", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/roles/gerente",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], MANAGER_ROLE);

    // 멤버십 제거
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/roles/memberships",
        Some(&admin_token),
        Some(json!({ "email": "alice@example.com", "role": ADMIN_ROLE, "delete": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roles"], json!([]));
}

#[tokio::test]
async fn test_lookup_misses_return_not_found() {
    let app = test_app().await;
    let (_, body) = register(&app, "alice", "alice@example.com", "pw1234").await;
    let token = token_of(&body);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/roles/memberships",
        Some(&token),
        Some(json!({ "email": "ghost@example.com", "role": ADMIN_ROLE })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/roles/memberships",
        Some(&token),
        Some(json!({ "email": "alice@example.com", "role": "Missing" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_manager_can_read_single_role() {
    let app = test_app().await;
    let (_, body) = register(&app, "gina", "gina@example.com", "pw1234").await;
    let token = token_of(&body);

    send(
        &app,
        Method::PUT,
        "/api/v1/roles/memberships",
        Some(&token),
        Some(json!({ "email": "gina@example.com", "role": MANAGER_ROLE })),
    )
    .await;

    let (_, body) = login(&app, "gina", "pw1234").await;
    let manager_token = token_of(&body);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/roles/Admin",
        Some(&manager_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/api/v1/roles", Some(&manager_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = test_app().await;

    let (status, _) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"]["status"], "up");
}

#[tokio::test]
async fn test_email_is_unique_across_users() {
    let app = test_app().await;
    register(&app, "mallory", "alice@example.com", "pw1234").await;

    // 이메일 생략 시 사용자 이름이 이메일이 되므로 같은 주소로 충돌
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users/register",
        None,
        Some(json!({
            "userName": "alice@example.com",
            "password": "pw1234",
            "confirmPassword": "pw1234"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = register(&app, "alice", "ALICE@example.com", "pw1234").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(app.store.identity_count().await, 1);

    let (status, _) = login(&app, "alice", "pw1234").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_membership_update_targets_single_email_owner() {
    let app = test_app().await;
    let (_, body) = register(&app, "mallory", "alice@example.com", "pw1234").await;
    let token = token_of(&body);
    let (status, _) = register(&app, "alice", "alice@example.com", "pw1234").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/roles/memberships",
        Some(&token),
        Some(json!({ "email": "alice@example.com", "role": MANAGER_ROLE })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["roles"], json!([MANAGER_ROLE]));

    let (_, body) = login(&app, "mallory", "pw1234").await;
    let claims = app.validator.validate(&token_of(&body)).unwrap();
    assert_eq!(claims.unique_name, "mallory");
    assert_eq!(claims.role, vec![MANAGER_ROLE.to_string()]);
}

#[tokio::test]
async fn test_malformed_body_returns_json_error() {
    let app = test_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/users/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"userName\": \"alice\""))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // Content-Type 누락도 같은 형식
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/users/register")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
