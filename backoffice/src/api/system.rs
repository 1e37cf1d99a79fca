//! System API (liveness / idempotency token).

use super::error::{ApiResponse, ApiResult};
use crate::AppState;
use axum::extract::State;
use serde::Serialize;

/// 冪等性トークンのレスポンス
#[derive(Debug, Serialize)]
pub struct IdempotencyTokenResponse {
    /// `Idempotency-Key` ヘッダーに載せるトークン
    pub token: String,
}

/// GET /api/v1/ping
pub async fn ping() -> ApiResponse<&'static str> {
    ApiResponse::ok("pong")
}

/// GET /api/v1/idempotency-token
///
/// 作成系の管理APIを呼ぶ前に取得する。トークンは一度だけ使える。
pub async fn idempotency_token(
    State(state): State<AppState>,
) -> ApiResult<IdempotencyTokenResponse> {
    let token = state.idempotency.issue_token().await?;
    Ok(ApiResponse::ok(IdempotencyTokenResponse { token }))
}
