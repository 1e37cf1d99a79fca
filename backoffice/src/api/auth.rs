//! 認証API
//!
//! ログイン、トークン更新、ログアウト、パスワード変更

use super::error::{ApiResponse, ApiResult};
use super::validation::{self, JsonBody, PASSWORD_LEN};
use crate::auth::middleware::AuthUser;
use crate::common::ip::ClientInfo;
use crate::service;
use crate::service::auth::IssuedTokens;
use crate::AppState;
use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};

/// ログインリクエスト
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// メールアドレス
    pub email: String,
    /// パスワード
    pub password: String,
}

/// トークン更新リクエスト
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    /// リフレッシュトークン
    pub refresh_token: String,
}

/// パスワード変更リクエスト
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// 現在のパスワード
    pub old_password: String,
    /// 新しいパスワード
    pub new_password: String,
}

/// トークンの主体
#[derive(Debug, Serialize)]
pub struct TokenMeta {
    /// ユーザーID
    pub user_id: String,
    /// ユーザー名
    pub username: String,
    /// メールアドレス
    pub email: String,
    /// ロール
    pub role: String,
}

/// ログイン・トークン更新のレスポンス
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// アクセストークン
    pub access_token: String,
    /// リフレッシュトークン
    pub refresh_token: String,
    /// アクセストークン有効期限（秒）
    pub expires_in: u64,
    /// ユーザー情報
    pub meta: TokenMeta,
}

impl From<IssuedTokens> for TokenResponse {
    fn from(tokens: IssuedTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            meta: TokenMeta {
                user_id: tokens.user.id.to_string(),
                username: tokens.user.username,
                email: tokens.user.email,
                role: tokens.user.role.to_string(),
            },
        }
    }
}

/// POST /api/v1/auth/login - ログイン
///
/// メールアドレスとパスワードで認証し、トークン一式を発行する。
/// 成功したログインはログインログとしてバッファに積まれる。
///
/// # Returns
/// * `200` - ログイン成功
/// * `400` - 入力不備
/// * `401` - ユーザー不在またはパスワード不一致（区別しない）
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<TokenResponse> {
    validation::email("email", &request.email)?;
    validation::required(
        "password",
        Some(request.password.as_str()).filter(|p| !p.is_empty()),
    )?;

    let tokens = service::auth::login(&state, &request.email, &request.password, &client).await?;
    Ok(ApiResponse::ok(tokens.into()))
}

/// POST /api/v1/auth/refresh - トークン更新
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RefreshTokenRequest>,
) -> ApiResult<TokenResponse> {
    validation::required(
        "refresh_token",
        Some(request.refresh_token.as_str()).filter(|t| !t.is_empty()),
    )?;

    let tokens = service::auth::refresh(&state, &request.refresh_token).await?;
    Ok(ApiResponse::ok(tokens.into()))
}

/// POST /api/v1/auth/logout - ログアウト
///
/// 提示されたアクセストークンを失効させる。
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<()> {
    service::auth::logout(&state, &auth_user.token).await?;
    Ok(ApiResponse::empty())
}

/// PUT /api/v1/change-password - 自分のパスワード変更
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    JsonBody(request): JsonBody<ChangePasswordRequest>,
) -> ApiResult<()> {
    validation::required(
        "old_password",
        Some(request.old_password.as_str()).filter(|p| !p.is_empty()),
    )?;
    validation::length("new_password", &request.new_password, PASSWORD_LEN)?;

    service::auth::change_password(
        &state,
        auth_user.user_id,
        &request.old_password,
        &request.new_password,
    )
    .await?;
    Ok(ApiResponse::empty())
}
