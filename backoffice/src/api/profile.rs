//! プロフィールAPI

use super::error::{ApiResponse, ApiResult};
use super::validation::format_time;
use crate::auth::middleware::AuthUser;
use crate::service;
use crate::types::User;
use crate::AppState;
use axum::{extract::State, Extension};
use serde::Serialize;

/// プロフィール
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// ユーザーID
    pub user_id: String,
    /// ユーザー名
    pub username: String,
    /// メールアドレス
    pub email: String,
    /// ロール
    pub role: String,
    /// 所属組織
    pub organization: String,
    /// 最終ログイン日時（未ログインは空文字）
    pub last_login: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id.to_string(),
            last_login: user.last_login.as_ref().map(format_time).unwrap_or_default(),
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            organization: user.organization,
        }
    }
}

/// GET /api/v1/profile - 呼び出し元自身のユーザー情報
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<ProfileResponse> {
    let user = service::profile::get_profile(&state, auth_user.user_id).await?;
    Ok(ApiResponse::ok(user.into()))
}
