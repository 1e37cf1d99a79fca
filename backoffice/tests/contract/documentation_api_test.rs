//! ドキュメントAPI Contract Tests

use crate::support::create_test_app;
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_documentation_lifecycle() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;
    let user = app.user_token().await;

    let (status, body) = app
        .create(
            "/api/v1/admin/documentation",
            &admin,
            json!({ "title": "Getting started", "content": "Read this first." }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let doc_id = body["data"]["document_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            Method::GET,
            "/api/v1/documentation/list?page=1&pageSize=5",
            Some(&user),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(
        body["data"]["documentation_summary_list"][0]["document_id"],
        doc_id
    );

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/v1/admin/documentation",
            Some(&admin),
            Some(json!({ "documentation_id": doc_id, "content": "Updated." })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let get_uri = format!("/api/v1/documentation?documentationID={}", doc_id);
    let (_, body) = app.send(Method::GET, &get_uri, Some(&user), None).await;
    assert_eq!(body["data"]["title"], "Getting started");
    assert_eq!(body["data"]["content"], "Updated.");

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/v1/admin/documentation?documentationID={}", doc_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::GET, &get_uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_documentation_input_limits() {
    let app = create_test_app().await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .create(
            "/api/v1/admin/documentation",
            &admin,
            json!({ "title": "", "content": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2001);

    let (status, _) = app
        .create(
            "/api/v1/admin/documentation",
            &admin,
            json!({ "title": "Too long", "content": "x".repeat(10_001) }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/v1/admin/documentation",
            Some(&admin),
            Some(json!({ "title": "No id" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2001);
}

#[tokio::test]
async fn test_user_cannot_write_documentation() {
    let app = create_test_app().await;
    let user = app.user_token().await;

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!(
                "/api/v1/admin/documentation?documentationID={}",
                uuid::Uuid::new_v4()
            ),
            Some(&user),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
