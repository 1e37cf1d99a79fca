//! REST APIハンドラー
//!
//! すべてのエンドポイントは `/api/v1` 配下に置く

/// エラー・成功レスポンスのエンベロープ
pub mod error;

/// リクエストの抽出と入力検証
pub mod validation;

/// 死活確認・冪等性トークン
pub mod system;

/// ログイン・トークン更新・ログアウト
pub mod auth;

/// プロフィール
pub mod profile;

/// お知らせ
pub mod notices;

/// ドキュメント
pub mod documentation;

/// ユーザー管理
pub mod users;

/// ログ参照
pub mod logs;

use crate::auth::middleware::{access_token_middleware, require_admin_middleware};
use crate::idempotency::idempotency_middleware;
use crate::rate_limit::rate_limit_middleware;
use crate::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// APIルーターを組み立てる
///
/// ミドルウェアの順序: レート制限 → アクセストークン検証 → 管理者ロール確認 → 冪等性トークン消費
pub fn create_app(state: AppState) -> Router {
    let idempotent = || from_fn_with_state(state.clone(), idempotency_middleware);

    let public = Router::new()
        .route("/ping", get(system::ping))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh));

    let admin = Router::new()
        .route(
            "/admin/notice",
            post(notices::insert_notice)
                .route_layer(idempotent())
                .put(notices::update_notice)
                .delete(notices::delete_notice),
        )
        .route(
            "/admin/documentation",
            post(documentation::insert_documentation)
                .route_layer(idempotent())
                .put(documentation::update_documentation)
                .delete(documentation::delete_documentation),
        )
        .route(
            "/admin/user",
            post(users::insert_user)
                .route_layer(idempotent())
                .get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/admin/user/list", get(users::get_user_list))
        .route("/admin/user/password", put(users::change_user_password))
        .route("/admin/login-log/list", get(logs::get_login_log_list))
        .route("/admin/operation-log/list", get(logs::get_operation_log_list))
        .route_layer(from_fn_with_state(state.clone(), require_admin_middleware));

    let authenticated = Router::new()
        .route("/idempotency-token", get(system::idempotency_token))
        .route("/auth/logout", post(auth::logout))
        .route("/profile", get(profile::get_profile))
        .route("/change-password", put(auth::change_password))
        .route("/notice", get(notices::get_notice))
        .route("/notice/list", get(notices::get_notice_list))
        .route("/documentation", get(documentation::get_documentation))
        .route("/documentation/list", get(documentation::get_documentation_list))
        .merge(admin)
        .route_layer(from_fn_with_state(state.clone(), access_token_middleware));

    let request_timeout = state.config.server.request_timeout;

    Router::new()
        .nest("/api/v1", public.merge(authenticated))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
