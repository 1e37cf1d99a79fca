// 認証ミドルウェア実装

use crate::api::error::AppError;
use crate::common::error::AdminError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// 認証済みユーザー
///
/// アクセストークンミドルウェアがrequestの拡張データに格納する。
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// トークンのsubject
    pub user_id: Uuid,
    /// 提示されたアクセストークン（ログアウト時の失効に使う）
    pub token: String,
}

/// Authorizationヘッダーから "Bearer {token}" を取り出す
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AdminError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(AdminError::TokenMissing(
            "Missing Authorization header".to_string(),
        ));
    };
    let value = value
        .to_str()
        .map_err(|_| AdminError::TokenInvalid("Invalid Authorization header".to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or_else(|| {
            AdminError::TokenInvalid(
                "Invalid Authorization header format. Expected 'Bearer <token>'".to_string(),
            )
        })?;
    if token.is_empty() {
        return Err(AdminError::TokenMissing("Empty bearer token".to_string()));
    }
    Ok(token.to_string())
}

/// アクセストークン認証ミドルウェア
///
/// 失効済みかどうかを署名検証より先に確認する。失効済みトークンは
/// 署名が有効でも`TokenInvalid`。
pub async fn access_token_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())?;

    if state.revocations.is_revoked(&token).await? {
        tracing::debug!("Rejected revoked access token");
        return Err(AdminError::TokenInvalid("Token has been revoked".to_string()).into());
    }

    let subject = state.tokens.verify_access_token(&token).map_err(|e| {
        tracing::debug!(error = %e, "Access token verification failed");
        e
    })?;
    let user_id = Uuid::parse_str(&subject)
        .map_err(|_| AdminError::TokenInvalid("Token subject is not a user id".to_string()))?;

    request.extensions_mut().insert(AuthUser { user_id, token });
    Ok(next.run(request).await)
}

/// 管理者ロールを要求するミドルウェア
///
/// `access_token_middleware`の内側に置く。ロールはトークンではなく現在の
/// ユーザーレコードから判定するため、降格・削除は即座に反映される。
pub async fn require_admin_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| AdminError::TokenMissing("Authentication required".to_string()))?;

    let user = match state.users.get_by_id(auth_user.user_id).await {
        Ok(user) => user,
        Err(AdminError::NotFound(_)) => {
            return Err(AdminError::PermissionDenied("User no longer exists".to_string()).into())
        }
        Err(e) => return Err(e.into()),
    };
    if !user.is_admin() {
        tracing::warn!(user_id = %user.id, "Non-admin user attempted admin operation");
        return Err(AdminError::PermissionDenied("Admin role required".to_string()).into());
    }

    Ok(next.run(request).await)
}
