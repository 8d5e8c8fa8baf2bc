mod common;

use common::TestSession;
use serde_json::json;
use session_store::dtos::Registration;
use session_store::SessionError;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn register_returns_backend_body_without_signing_in() {
    let app = TestSession::spawn().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_json(json!({
            "firstName": "Priya",
            "lastName": "Raman",
            "email": "priya@example.com",
            "password": "s3cret-pass",
            "phone": "+1 555 0100"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Registration successful. Please check your email to verify your account.",
            "userId": "42"
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let registration = Registration::new("Priya", "Raman", "priya@example.com", "s3cret-pass")
        .with_phone("+1 555 0100");
    let body = app.store.register(&registration).await.unwrap();

    assert_eq!(body["userId"], "42");
    assert!(!app.store.is_authenticated());
    assert!(!app.store.is_loading());
    assert_eq!(app.stored_token(), None);
    assert_eq!(app.stored_user(), None);
}

#[tokio::test]
async fn register_with_empty_success_body_succeeds() {
    let app = TestSession::spawn().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&app.server)
        .await;

    let body = app
        .store
        .register(&Registration::new("Priya", "Raman", "priya@example.com", "s3cret-pass"))
        .await
        .unwrap();

    assert!(body.is_null());
    assert!(!app.store.is_authenticated());
    assert!(!app.store.is_loading());
}

#[tokio::test]
async fn resend_with_no_content_succeeds() {
    let app = TestSession::spawn().await;
    Mock::given(method("POST"))
        .and(path("/auth/resend-verification"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&app.server)
        .await;

    let body = app.store.resend_verification("priya@example.com").await.unwrap();
    assert!(body.is_null());
}

#[tokio::test]
async fn register_conflict_is_reported() {
    let app = TestSession::spawn().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "error": "Email already registered" })),
        )
        .mount(&app.server)
        .await;

    let err = app
        .store
        .register(&Registration::new("John", "Doe", "demo@h1bconnect.com", "validpass"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Email already registered");
    assert_eq!(err.status(), Some(409));
    assert!(!app.store.is_loading());
    assert_eq!(app.stored_token(), None);
}

#[tokio::test]
async fn expired_verification_link_is_discriminated() {
    let app = TestSession::spawn().await;
    Mock::given(method("POST"))
        .and(path("/auth/verify-email"))
        .and(body_json(json!({ "token": "old-link" })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Verification link has expired",
            "code": "TOKEN_EXPIRED"
        })))
        .mount(&app.server)
        .await;

    let err = app.store.verify_email("old-link").await.unwrap_err();

    match err {
        SessionError::TokenExpired { message } => {
            assert_eq!(message, "Verification link has expired")
        }
        other => panic!("expected TokenExpired, got {other:?}"),
    }
    assert!(!app.store.is_loading());
}

#[tokio::test]
async fn verification_and_resend_succeed() {
    let app = TestSession::spawn().await;
    Mock::given(method("POST"))
        .and(path("/auth/verify-email"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "Email verified successfully" })),
        )
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/resend-verification"))
        .and(body_json(json!({ "email": "priya@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Sent" })))
        .expect(1)
        .mount(&app.server)
        .await;

    let verified = app.store.verify_email("fresh-link").await.unwrap();
    assert_eq!(verified["message"], "Email verified successfully");

    let resent = app.store.resend_verification("priya@example.com").await.unwrap();
    assert_eq!(resent["message"], "Sent");

    assert!(!app.store.is_authenticated());
}
