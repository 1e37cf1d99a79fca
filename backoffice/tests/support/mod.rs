//! 契約テスト用のアプリケーション組み立てとHTTPヘルパー

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use backoffice::auth::password::hash_password_with_cost;
use backoffice::cache::MemoryCache;
use backoffice::config::{AppConfig, DatabaseConfig, LimiterConfig};
use backoffice::types::{User, UserRole};
use backoffice::{api, db, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "password123";
pub const USER_EMAIL: &str = "user@example.com";
pub const USER_PASSWORD: &str = "password456";

/// テスト用アプリケーション
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// インメモリSQLiteとプロセス内キャッシュで組み立て、管理者と一般ユーザーを1人ずつ登録する
pub async fn create_test_app() -> TestApp {
    create_test_app_with(|_| {}).await
}

/// `create_test_app`に設定の上書きを加えたもの
pub async fn create_test_app_with(configure: impl FnOnce(&mut AppConfig)) -> TestApp {
    let mut config = AppConfig {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            // インメモリDBは接続ごとに別物になる
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
        },
        // 全テストが同じ接続元として数えられる
        limiter: LimiterConfig {
            max: 10_000,
            ..LimiterConfig::default()
        },
        ..AppConfig::default()
    };
    configure(&mut config);

    let db_pool = db::connect(&config.database)
        .await
        .expect("Failed to create test database");
    db::migrate(&db_pool)
        .await
        .expect("Failed to run migrations");

    let state = AppState::new(config, db_pool, Arc::new(MemoryCache::new()))
        .expect("test config is valid");

    seed_user(&state, "admin", ADMIN_EMAIL, ADMIN_PASSWORD, UserRole::Admin).await;
    seed_user(&state, "member", USER_EMAIL, USER_PASSWORD, UserRole::User).await;

    TestApp {
        router: api::create_app(state.clone()),
        state,
    }
}

async fn seed_user(state: &AppState, username: &str, email: &str, password: &str, role: UserRole) {
    let hash = hash_password_with_cost(password, 4).unwrap();
    let user = User::new(username, email, hash, role, "acme");
    state.users.insert(&user).await.unwrap();
}

impl TestApp {
    /// JSONボディ付きでリクエストを送り、ステータスとエンベロープを返す
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send_with_headers(method, uri, token, body, &[]).await
    }

    pub async fn send_with_headers(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// ログインしてレスポンスのdataを返す
    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send_with_headers(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
            &[("user-agent", "contract-test"), ("x-forwarded-for", "203.0.113.7")],
        )
        .await
    }

    pub async fn access_token(&self, email: &str, password: &str) -> String {
        let (status, body) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["data"]["access_token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.access_token(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn user_token(&self) -> String {
        self.access_token(USER_EMAIL, USER_PASSWORD).await
    }

    /// 冪等性トークンを取得する
    pub async fn idempotency_token(&self, token: &str) -> String {
        let (status, body) = self
            .send(Method::GET, "/api/v1/idempotency-token", Some(token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    /// 冪等性トークン付きで作成系APIを呼ぶ
    pub async fn create(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        let key = self.idempotency_token(token).await;
        self.send_with_headers(
            Method::POST,
            uri,
            Some(token),
            Some(body),
            &[("Idempotency-Key", key.as_str())],
        )
        .await
    }
}
