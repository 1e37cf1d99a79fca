//! お知らせAPI Contract Tests
//!
//! GET /api/v1/notice, GET /api/v1/notice/list,
//! POST/PUT/DELETE /api/v1/admin/notice

use crate::support::create_test_app;
use axum::http::{Method, StatusCode};
use serde_json::json;

fn notice_body(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "content": "# maintenance\nplanned downtime",
        "notice_type": "URGENT",
    })
}

#[tokio::test]
async fn test_admin_creates_and_everyone_reads() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;
    let user = app.user_token().await;

    let (status, body) = app
        .create("/api/v1/admin/notice", &admin, notice_body("Maintenance"))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let notice_id = body["data"]["notice_id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["type"], "URGENT");

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/v1/notice?noticeID={}", notice_id),
            Some(&user),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Maintenance");
    assert_eq!(body["data"]["content"], "# maintenance\nplanned downtime");

    let (status, body) = app
        .send(Method::GET, "/api/v1/notice/list?page=1&pageSize=10", Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["notice_summary_list"][0]["notice_id"], notice_id);
    assert!(body["data"]["notice_summary_list"][0].get("content").is_none());
}

#[tokio::test]
async fn test_non_admin_cannot_write() {
    let app = create_test_app().await;
    let user = app.user_token().await;

    let (status, body) = app
        .create("/api/v1/admin/notice", &user, notice_body("Nope"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 1006);
}

#[tokio::test]
async fn test_create_requires_single_use_idempotency_key() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/admin/notice",
            Some(&admin),
            Some(notice_body("No key")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2002);

    let key = app.idempotency_token(&admin).await;
    let headers = [("Idempotency-Key", key.as_str())];
    let (status, _) = app
        .send_with_headers(
            Method::POST,
            "/api/v1/admin/notice",
            Some(&admin),
            Some(notice_body("First")),
            &headers,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // 同じトークンでの再送は処理されない
    let (status, body) = app
        .send_with_headers(
            Method::POST,
            "/api/v1/admin/notice",
            Some(&admin),
            Some(notice_body("Second")),
            &headers,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2002);

    let (_, body) = app
        .send(Method::GET, "/api/v1/notice/list", Some(&admin), None)
        .await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_update_is_visible_to_cached_readers() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;

    let (_, body) = app
        .create("/api/v1/admin/notice", &admin, notice_body("Before"))
        .await;
    let notice_id = body["data"]["notice_id"].as_str().unwrap().to_string();
    let get_uri = format!("/api/v1/notice?noticeID={}", notice_id);

    // キャッシュに載せる
    let (_, body) = app.send(Method::GET, &get_uri, Some(&admin), None).await;
    assert_eq!(body["data"]["title"], "Before");
    let (_, body) = app
        .send(Method::GET, "/api/v1/notice/list", Some(&admin), None)
        .await;
    assert_eq!(body["data"]["notice_summary_list"][0]["title"], "Before");

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/v1/admin/notice",
            Some(&admin),
            Some(json!({ "notice_id": notice_id, "title": "After", "notice_type": "NORMAL" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.send(Method::GET, &get_uri, Some(&admin), None).await;
    assert_eq!(body["data"]["title"], "After");
    assert_eq!(body["data"]["type"], "NORMAL");
    let (_, body) = app
        .send(Method::GET, "/api/v1/notice/list", Some(&admin), None)
        .await;
    assert_eq!(body["data"]["notice_summary_list"][0]["title"], "After");
}

#[tokio::test]
async fn test_delete_then_read_is_not_found() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;

    let (_, body) = app
        .create("/api/v1/admin/notice", &admin, notice_body("Short lived"))
        .await;
    let notice_id = body["data"]["notice_id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/admin/notice?noticeID={}", notice_id);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/v1/notice?noticeID={}", notice_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 3001);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_title_is_rejected() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;

    let (status, _) = app
        .create("/api/v1/admin/notice", &admin, notice_body("Same"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .create("/api/v1/admin/notice", &admin, notice_body("Same"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 3003);
}

#[tokio::test]
async fn test_invalid_queries_use_error_envelope() {
    let app = create_test_app().await;
    let user = app.user_token().await;

    for uri in [
        "/api/v1/notice",
        "/api/v1/notice?noticeID=not-a-uuid",
        "/api/v1/notice/list?page=0",
        "/api/v1/notice/list?pageSize=101",
        "/api/v1/notice/list?noticeType=SOMETIMES",
        "/api/v1/notice/list?updateStartTime=2024-02-01T00:00:00Z&updateEndTime=2024-01-01T00:00:00Z",
        "/api/v1/notice/list?updateStartTime=yesterday",
    ] {
        let (status, body) = app.send(Method::GET, uri, Some(&user), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["code"], 2001, "{}", uri);
    }
}

#[tokio::test]
async fn test_list_filters_by_type() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;

    app.create("/api/v1/admin/notice", &admin, notice_body("Urgent one"))
        .await;
    app.create(
        "/api/v1/admin/notice",
        &admin,
        json!({ "title": "Normal one", "content": "body", "notice_type": "NORMAL" }),
    )
    .await;

    let (_, body) = app
        .send(
            Method::GET,
            "/api/v1/notice/list?noticeType=NORMAL",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["notice_summary_list"][0]["title"], "Normal one");
}
