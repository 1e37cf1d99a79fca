//! APIエラーレスポンス型
//!
//! すべての応答を `{"code", "message", "data"}` の形にそろえる

use crate::common::error::AdminError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

/// 成功時の業務コード
pub const SUCCESS_CODE: u32 = 0;

/// Axum用のエラーレスポンス型
#[derive(Debug)]
pub struct AppError(pub AdminError);

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if self.0.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.code(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, code = self.0.code(), "Request rejected");
        }

        // 内部の詳細はログにだけ残す
        let payload = json!({
            "code": self.0.code(),
            "message": self.0.external_message(),
            "data": null,
        });

        (status, Json(payload)).into_response()
    }
}

/// 成功レスポンス
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// 業務コード（成功時は0）
    pub code: u32,
    /// メッセージ
    pub message: String,
    /// 応答データ
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// データ付きの成功レスポンス
    pub fn ok(data: T) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: "ok".to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// データなしの成功レスポンス
    pub fn empty() -> Self {
        Self {
            code: SUCCESS_CODE,
            message: "ok".to_string(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// ハンドラーの戻り値
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;
