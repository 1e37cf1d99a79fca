use crate::audit::LoginLogEvent;
use crate::auth::password::{hash_password, verify_password};
use crate::common::error::{AdminError, AdminResult};
use crate::common::ip::ClientInfo;
use crate::types::User;
use crate::AppState;
use chrono::Utc;
use std::time::Duration;
use uuid::Uuid;

/// 認証失敗時のメッセージ（ユーザー不在とパスワード不一致を区別しない）
const LOGIN_FAILED_MESSAGE: &str = "user not exist or password wrong";

/// 発行したトークン一式
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    /// アクセストークン
    pub access_token: String,
    /// リフレッシュトークン
    pub refresh_token: String,
    /// アクセストークンの有効秒数
    pub expires_in: u64,
    /// トークンの主体
    pub user: User,
}

fn issue_pair(state: &AppState, user: User) -> AdminResult<IssuedTokens> {
    let subject = user.id.to_string();
    let access_token = state.tokens.issue_access_token(&subject)?;
    let refresh_token = state.tokens.issue_refresh_token(&subject)?;
    Ok(IssuedTokens {
        access_token,
        refresh_token,
        expires_in: state.tokens.lifetimes().access_token_lifetime.as_secs(),
        user,
    })
}

/// ログイン
///
/// 成功時は最終ログイン日時を更新し、ログインイベントをキューへ積む。
pub async fn login(
    state: &AppState,
    email: &str,
    password: &str,
    client: &ClientInfo,
) -> AdminResult<IssuedTokens> {
    let user = match state.users.get_by_email(email).await {
        Ok(user) => user,
        Err(AdminError::NotFound(_)) => {
            tracing::debug!("Login rejected: unknown email");
            return Err(AdminError::AuthenticationFailed(LOGIN_FAILED_MESSAGE.to_string()));
        }
        Err(e) => return Err(e),
    };
    if !verify_password(password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AdminError::AuthenticationFailed(LOGIN_FAILED_MESSAGE.to_string()));
    }

    let tokens = issue_pair(state, user)?;
    state.users.update_last_login(tokens.user.id).await?;

    let event = LoginLogEvent::new(tokens.user.id, &client.ip_address, &client.user_agent);
    state.log_buffer.enqueue_login(&event).await;

    tracing::info!(user_id = %tokens.user.id, "User logged in");
    Ok(tokens)
}

/// リフレッシュトークンから新しいトークン一式を発行する
pub async fn refresh(state: &AppState, refresh_token: &str) -> AdminResult<IssuedTokens> {
    let subject = state.tokens.verify_refresh_token(refresh_token)?;
    let user_id = Uuid::parse_str(&subject)
        .map_err(|_| AdminError::TokenInvalid("Token subject is not a user id".to_string()))?;
    let user = state.users.get_by_id(user_id).await?;
    issue_pair(state, user)
}

/// アクセストークンを失効させる
///
/// 失効期間はトークンの残り寿命と設定値の長い方。
pub async fn logout(state: &AppState, access_token: &str) -> AdminResult<()> {
    let remaining = state.tokens.verify_signature(access_token).ok().map(|claims| {
        let now = Utc::now().timestamp().max(0) as u64;
        Duration::from_secs(claims.exp.saturating_sub(now))
    });
    state.revocations.revoke(access_token, remaining).await?;
    tracing::info!("Access token revoked");
    Ok(())
}

/// 自分のパスワードを変更する
pub async fn change_password(
    state: &AppState,
    user_id: Uuid,
    old_password: &str,
    new_password: &str,
) -> AdminResult<()> {
    let user = state.users.get_by_id(user_id).await?;
    if !verify_password(old_password, &user.password_hash)? {
        return Err(AdminError::AuthenticationFailed(
            "old password wrong".to_string(),
        ));
    }
    let password_hash = hash_password(new_password)?;
    state.users.update_password(user_id, &password_hash).await?;
    tracing::info!(user_id = %user_id, "Password changed");
    Ok(())
}
