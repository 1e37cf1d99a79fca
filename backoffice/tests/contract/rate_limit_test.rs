//! レート制限 Contract Tests
//!
//! 接続元IPごとに上限を超えたリクエストは 429 / code 4001

use crate::support::create_test_app_with;
use axum::http::{Method, StatusCode};

const FIRST_CLIENT: &[(&str, &str)] = &[("x-forwarded-for", "198.51.100.1")];
const SECOND_CLIENT: &[(&str, &str)] = &[("x-forwarded-for", "198.51.100.2")];

#[tokio::test]
async fn test_requests_over_limit_get_429() {
    let app = create_test_app_with(|config| config.limiter.max = 3).await;

    for _ in 0..3 {
        let (status, _) = app
            .send_with_headers(Method::GET, "/api/v1/ping", None, None, FIRST_CLIENT)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app
        .send_with_headers(Method::GET, "/api/v1/ping", None, None, FIRST_CLIENT)
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], 4001);

    // 拒否は他の接続元に影響しない
    let (status, body) = app
        .send_with_headers(Method::GET, "/api/v1/ping", None, None, SECOND_CLIENT)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "pong");
}

#[tokio::test]
async fn test_limit_applies_before_authentication() {
    let app = create_test_app_with(|config| config.limiter.max = 1).await;

    let (status, _) = app
        .send_with_headers(Method::GET, "/api/v1/profile", None, None, FIRST_CLIENT)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send_with_headers(Method::GET, "/api/v1/profile", None, None, FIRST_CLIENT)
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], 4001);
}

#[tokio::test]
async fn test_disabled_limiter_lets_everything_through() {
    let app = create_test_app_with(|config| {
        config.limiter.enabled = false;
        config.limiter.max = 1;
    })
    .await;

    for _ in 0..5 {
        let (status, _) = app
            .send_with_headers(Method::GET, "/api/v1/ping", None, None, FIRST_CLIENT)
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}
