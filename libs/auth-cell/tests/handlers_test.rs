use std::sync::Arc;
use axum::{extract::{Extension, State}, http::{HeaderMap, HeaderValue}};

use auth_cell::handlers::{get_session, validate_token, verify_token};
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::test_utils::{TestConfig, TestUser, JwtTestUtils};

fn create_test_config() -> AppConfig {
    TestConfig::default().to_app_config()
}

fn create_auth_header(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers
}

#[tokio::test]
async fn test_validate_token_success() {
    let config = Arc::new(create_test_config());
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let response = validate_token(State(config), create_auth_header(&token)).await.unwrap().0;

    assert!(response.valid);
    assert_eq!(response.user_id, user.id);
    assert_eq!(response.email, Some(user.email));
    assert_eq!(response.role, Some(user.role));
}

#[tokio::test]
async fn test_validate_token_missing_header() {
    let config = Arc::new(create_test_config());

    let result = validate_token(State(config), HeaderMap::new()).await;

    match result.unwrap_err() {
        AppError::Auth(msg) => assert_eq!(msg, "Missing authorization header"),
        other => panic!("Expected Auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_validate_token_no_bearer_prefix() {
    let config = Arc::new(create_test_config());
    let mut headers = HeaderMap::new();
    headers.insert("authorization", HeaderValue::from_static("sometoken"));

    let result = validate_token(State(config), headers).await;

    match result.unwrap_err() {
        AppError::Auth(msg) => assert_eq!(msg, "Invalid authorization header format"),
        other => panic!("Expected Auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_validate_token_expired() {
    let config = Arc::new(create_test_config());
    let token = JwtTestUtils::create_expired_token(&TestUser::default(), &config.supabase_jwt_secret);

    let result = validate_token(State(config), create_auth_header(&token)).await;

    assert!(matches!(result, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn test_validate_token_invalid_signature() {
    let config = Arc::new(create_test_config());
    let token = JwtTestUtils::create_invalid_signature_token(&TestUser::default());

    let result = validate_token(State(config), create_auth_header(&token)).await;

    assert!(matches!(result, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn test_verify_token_reports_validity_without_failing() {
    let config = Arc::new(create_test_config());
    let user = TestUser::admin("admin@example.com");

    let good = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));
    let response = verify_token(State(config.clone()), create_auth_header(&good)).await.unwrap().0;
    assert_eq!(response["valid"], true);

    let expired = JwtTestUtils::create_expired_token(&user, &config.supabase_jwt_secret);
    let response = verify_token(State(config), create_auth_header(&expired)).await.unwrap().0;
    assert_eq!(response["valid"], false);
}

#[tokio::test]
async fn test_session_carries_phone_and_name() {
    let user = TestUser::patient("member@example.com")
        .with_phone("010-2222-3333")
        .with_name("Lee Soo");

    let session = get_session(Extension(user.to_user())).await.unwrap().0;

    assert_eq!(session.user_id, user.id);
    assert_eq!(session.phone.as_deref(), Some("010-2222-3333"));
    assert_eq!(session.name.as_deref(), Some("Lee Soo"));
    assert_eq!(session.role, "user");
    assert!(!session.is_admin);
}
