//! 認証API Contract Tests
//!
//! POST /api/v1/auth/login, POST /api/v1/auth/refresh, POST /api/v1/auth/logout,
//! GET /api/v1/profile, PUT /api/v1/change-password

use crate::support::{create_test_app, ADMIN_EMAIL, ADMIN_PASSWORD, USER_EMAIL, USER_PASSWORD};
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_ping_needs_no_token() {
    let app = create_test_app().await;
    let (status, body) = app.send(Method::GET, "/api/v1/ping", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "code": 0, "message": "ok", "data": "pong" }));
}

#[tokio::test]
async fn test_login_success_returns_tokens_and_meta() {
    let app = create_test_app().await;
    let (status, body) = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    let data = &body["data"];
    assert!(data["access_token"].is_string());
    assert!(data["refresh_token"].is_string());
    assert_eq!(data["expires_in"], 7200);
    assert_eq!(data["meta"]["email"], ADMIN_EMAIL);
    assert_eq!(data["meta"]["username"], "admin");
    assert_eq!(data["meta"]["role"], "ADMIN");
}

#[tokio::test]
async fn test_login_failure_does_not_reveal_which_part_was_wrong() {
    let app = create_test_app().await;

    let (status, wrong_password) = app.login(ADMIN_EMAIL, "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password["code"], 1002);

    let (status, unknown_user) = app.login("nobody@example.com", ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user["message"], wrong_password["message"]);
}

#[tokio::test]
async fn test_login_rejects_malformed_input() {
    let app = create_test_app().await;

    let (status, body) = app.login("not-an-email", ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2001);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2001);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_protected_route_requires_bearer_token() {
    let app = create_test_app().await;

    let (status, body) = app.send(Method::GET, "/api/v1/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1005);

    let (status, body) = app
        .send(Method::GET, "/api/v1/profile", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1003);
}

#[tokio::test]
async fn test_profile_returns_caller() {
    let app = create_test_app().await;
    let token = app.user_token().await;

    let (status, body) = app
        .send(Method::GET, "/api/v1/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], USER_EMAIL);
    assert_eq!(body["data"]["role"], "USER");
    assert_eq!(body["data"]["organization"], "acme");
    assert!(!body["data"]["last_login"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_logout_revokes_access_token() {
    let app = create_test_app().await;
    let token = app.user_token().await;

    let (status, _) = app
        .send(Method::GET, "/api/v1/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(Method::POST, "/api/v1/auth/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());

    // 署名・期限が有効でも失効済みなら拒否される
    let (status, body) = app
        .send(Method::GET, "/api/v1/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1003);
}

#[tokio::test]
async fn test_refresh_issues_usable_pair() {
    let app = create_test_app().await;
    let (_, login) = app.login(USER_EMAIL, USER_PASSWORD).await;
    let refresh_token = login["data"]["refresh_token"].as_str().unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meta"]["email"], USER_EMAIL);

    let access = body["data"]["access_token"].as_str().unwrap();
    let (status, _) = app
        .send(Method::GET, "/api/v1/profile", Some(access), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_access_and_refresh_tokens_are_not_interchangeable() {
    let app = create_test_app().await;
    let (_, login) = app.login(USER_EMAIL, USER_PASSWORD).await;
    let access = login["data"]["access_token"].as_str().unwrap();
    let refresh = login["data"]["refresh_token"].as_str().unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": access })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1003);

    let (status, _) = app
        .send(Method::GET, "/api/v1/profile", Some(refresh), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let app = create_test_app().await;
    let token = app.user_token().await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/v1/change-password",
            Some(&token),
            Some(json!({ "old_password": "not-my-password", "new_password": "brand-new-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/v1/change-password",
            Some(&token),
            Some(json!({ "old_password": USER_PASSWORD, "new_password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2001);

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/v1/change-password",
            Some(&token),
            Some(json!({ "old_password": USER_PASSWORD, "new_password": "brand-new-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.login(USER_EMAIL, USER_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login(USER_EMAIL, "brand-new-pass").await;
    assert_eq!(status, StatusCode::OK);
}
