//! ユーザー管理API Contract Tests
//!
//! POST/GET/PUT/DELETE /api/v1/admin/user, GET /api/v1/admin/user/list,
//! PUT /api/v1/admin/user/password

use crate::support::{create_test_app, TestApp, USER_EMAIL, USER_PASSWORD};
use axum::http::{Method, StatusCode};
use serde_json::json;

async fn create_user(app: &TestApp, admin: &str, username: &str, email: &str) -> String {
    let (status, body) = app
        .create(
            "/api/v1/admin/user",
            admin,
            json!({
                "username": username,
                "email": email,
                "password": "initial-pass",
                "organization": "research",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["role"], "USER");
    body["data"]["user_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_created_user_can_log_in() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;
    let user_id = create_user(&app, &admin, "carol", "carol@example.com").await;

    let (status, body) = app.login("carol@example.com", "initial-pass").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meta"]["user_id"], user_id);
    assert_eq!(body["data"]["meta"]["role"], "USER");
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .create(
            "/api/v1/admin/user",
            &admin,
            json!({
                "username": "another",
                "email": USER_EMAIL,
                "password": "initial-pass",
                "organization": "",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 3003);
}

#[tokio::test]
async fn test_insert_validates_fields() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;

    for payload in [
        json!({ "username": "ab", "email": "ab@example.com", "password": "initial-pass", "organization": "" }),
        json!({ "username": "abc", "email": "bad", "password": "initial-pass", "organization": "" }),
        json!({ "username": "abc", "email": "abc@example.com", "password": "short", "organization": "" }),
        json!({ "username": "abc", "email": "abc@example.com", "password": "initial-pass" }),
    ] {
        let (status, body) = app.create("/api/v1/admin/user", &admin, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 2001);
    }
}

#[tokio::test]
async fn test_get_update_and_list() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;
    let user_id = create_user(&app, &admin, "dave", "dave@example.com").await;

    let get_uri = format!("/api/v1/admin/user?userID={}", user_id);
    let (status, body) = app.send(Method::GET, &get_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["organization"], "research");
    assert_eq!(body["data"]["last_login"], "");
    assert!(body["data"].get("password_hash").is_none());

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/v1/admin/user",
            Some(&admin),
            Some(json!({ "user_id": user_id, "organization": "platform" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.send(Method::GET, &get_uri, Some(&admin), None).await;
    assert_eq!(body["data"]["organization"], "platform");
    assert_eq!(body["data"]["username"], "dave");

    let (status, body) = app
        .send(
            Method::GET,
            "/api/v1/admin/user/list?page=1&pageSize=10&desc=false&query=DAVE",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["user_list"][0]["user_id"], user_id);

    let (_, body) = app
        .send(
            Method::GET,
            "/api/v1/admin/user/list?role=ADMIN",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["user_list"][0]["username"], "admin");
}

#[tokio::test]
async fn test_admin_resets_password() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;
    let user_id = create_user(&app, &admin, "erin", "erin@example.com").await;

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/v1/admin/user/password",
            Some(&admin),
            Some(json!({ "user_id": user_id, "new_password": "reset-by-admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.login("erin@example.com", "initial-pass").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login("erin@example.com", "reset-by-admin").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_deleted_user_cannot_log_in_or_be_read() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;
    let user_id = create_user(&app, &admin, "frank", "frank@example.com").await;

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/v1/admin/user?userID={}", user_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.login("frank@example.com", "initial-pass").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/v1/admin/user?userID={}", user_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 3001);
}

#[tokio::test]
async fn test_regular_user_is_denied() {
    let app = create_test_app().await;
    let (_, login) = app.login(USER_EMAIL, USER_PASSWORD).await;
    let token = login["data"]["access_token"].as_str().unwrap();

    let (status, body) = app
        .send(Method::GET, "/api/v1/admin/user/list", Some(token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 1006);
}
