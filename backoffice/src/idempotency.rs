//! 冪等性トークン
//!
//! 作成系リクエストの二重送信を防ぐ。トークンは発行時にTTL付きで保存され、
//! 最初のチェックで消費される。

use crate::api::error::AppError;
use crate::cache::keys::{CacheKey, IDEMPOTENCY_PREFIX, PRESENCE_FLAG};
use crate::cache::SharedCache;
use crate::common::error::{AdminError, AdminResult};
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Duration;

/// 冪等性トークンを受け取るリクエストヘッダー
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// トークン長（英数字）
const TOKEN_LENGTH: usize = 32;

/// 冪等性ガード
#[derive(Clone)]
pub struct IdempotencyGuard {
    cache: SharedCache,
    ttl: Duration,
}

impl IdempotencyGuard {
    /// TTLを指定して作る
    pub fn new(cache: SharedCache, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    fn key(token: &str) -> String {
        CacheKey::new(IDEMPOTENCY_PREFIX, "token")
            .field("token", token)
            .build()
    }

    /// トークンを発行して保存する
    pub async fn issue_token(&self) -> AdminResult<String> {
        let token = crate::auth::generate_random_token(TOKEN_LENGTH);
        self.cache
            .set_ex(&Self::key(&token), PRESENCE_FLAG, self.ttl)
            .await
            .map_err(|e| {
                AdminError::ServiceError(format!("Failed to store idempotency token: {}", e))
            })?;
        Ok(token)
    }

    /// トークンを消費する
    ///
    /// 存在確認と削除を1回の削除操作で行うため、同じトークンで同時に来た
    /// リクエストのうち成功するのは1つだけ。
    pub async fn check(&self, token: &str) -> AdminResult<()> {
        if token.is_empty() {
            return Err(AdminError::IdempotencyViolation(
                "idempotency token is empty".to_string(),
            ));
        }
        let existed = self.cache.delete(&Self::key(token)).await.map_err(|e| {
            AdminError::ServiceError(format!("Failed to check idempotency token: {}", e))
        })?;
        if existed {
            Ok(())
        } else {
            Err(AdminError::IdempotencyViolation(
                "idempotency token is missing, expired or already used".to_string(),
            ))
        }
    }
}

/// `Idempotency-Key` ヘッダーのトークンを消費してから次へ進むミドルウェア
pub async fn idempotency_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(IDEMPOTENCY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    state.idempotency.check(&token).await?;
    Ok(next.run(request).await)
}
