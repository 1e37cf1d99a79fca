//! ログ参照API Contract Tests
//!
//! GET /api/v1/admin/login-log/list, GET /api/v1/admin/operation-log/list

use crate::support::{create_test_app, ADMIN_EMAIL, USER_EMAIL};
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_login_log_records_client_and_is_listed() {
    let app = create_test_app().await;
    let _ = app.user_token().await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .send(
            Method::GET,
            "/api/v1/admin/login-log/list?desc=false",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);

    let first = &body["data"]["login_log_list"][0];
    assert_eq!(first["email"], USER_EMAIL);
    assert_eq!(first["ip_address"], "203.0.113.7");
    assert_eq!(first["user_agent"], "contract-test");
    assert_eq!(body["data"]["login_log_list"][1]["email"], ADMIN_EMAIL);

    let (_, body) = app
        .send(
            Method::GET,
            "/api/v1/admin/login-log/list?query=member",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_admin_mutations_are_recorded_with_outcome() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .create(
            "/api/v1/admin/notice",
            &admin,
            json!({ "title": "Audited", "content": "body", "notice_type": "NORMAL" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let notice_id = body["data"]["notice_id"].as_str().unwrap().to_string();

    // 存在しない対象への削除は失敗として記録される
    let missing = uuid::Uuid::new_v4();
    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/v1/admin/notice?noticeID={}", missing),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(
            Method::GET,
            "/api/v1/admin/operation-log/list?desc=false&entityType=NOTICE",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);

    let created = &body["data"]["operation_log_list"][0];
    assert_eq!(created["operation"], "CREATE");
    assert_eq!(created["status"], "SUCCESS");
    assert_eq!(created["entity_id"], notice_id);
    assert_eq!(created["username"], "admin");

    let failed = &body["data"]["operation_log_list"][1];
    assert_eq!(failed["operation"], "DELETE");
    assert_eq!(failed["status"], "FAILURE");
    assert_eq!(failed["entity_id"], missing.to_string());
    assert!(failed["description"]
        .as_str()
        .unwrap()
        .starts_with("Failed to delete notice"));

    let (_, body) = app
        .send(
            Method::GET,
            "/api/v1/admin/operation-log/list?status=FAILURE",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_search_query_is_literal() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;
    app.create(
        "/api/v1/admin/notice",
        &admin,
        json!({ "title": "Plain title", "content": "body", "notice_type": "NORMAL" }),
    )
    .await;

    // `%` はワイルドカードではなく文字として扱われる
    let (status, body) = app
        .send(
            Method::GET,
            "/api/v1/admin/operation-log/list?query=%25",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);

    let (_, body) = app
        .send(
            Method::GET,
            "/api/v1/admin/operation-log/list?query=plain",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_log_list_rejects_bad_filters() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;

    for uri in [
        "/api/v1/admin/operation-log/list?operation=READ",
        "/api/v1/admin/login-log/list?createStartTime=2024-02-01T00:00:00Z&createEndTime=2024-01-01T00:00:00Z",
    ] {
        let (status, body) = app.send(Method::GET, uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["code"], 2001);
    }
}
