//! ログ参照API（管理者のみ）
//!
//! 一覧の前にバッファ済みのイベントを排出するため、直前の操作も反映される

use super::error::{ApiResponse, ApiResult};
use super::validation::{self, format_time, QueryParams};
use crate::service;
use crate::types::{
    EntityType, LoginLogEntry, LoginLogFilter, Operation, OperationLogEntry, OperationLogFilter,
    OperationStatus,
};
use crate::AppState;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ログインログ一覧のクエリ
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginLogListQuery {
    /// ページ番号
    pub page: Option<u32>,
    /// 1ページの件数
    pub page_size: Option<u32>,
    /// 降順か
    pub desc: Option<bool>,
    /// 部分一致
    pub query: Option<String>,
    /// 記録日時の下限
    pub create_start_time: Option<DateTime<Utc>>,
    /// 記録日時の上限
    pub create_end_time: Option<DateTime<Utc>>,
}

/// 操作ログ一覧のクエリ
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationLogListQuery {
    /// ページ番号
    pub page: Option<u32>,
    /// 1ページの件数
    pub page_size: Option<u32>,
    /// 降順か
    pub desc: Option<bool>,
    /// 部分一致
    pub query: Option<String>,
    /// 操作種別
    pub operation: Option<Operation>,
    /// 対象種別
    pub entity_type: Option<EntityType>,
    /// 結果
    pub status: Option<OperationStatus>,
    /// 記録日時の下限
    pub create_start_time: Option<DateTime<Utc>>,
    /// 記録日時の上限
    pub create_end_time: Option<DateTime<Utc>>,
}

/// ログインログ
#[derive(Debug, Serialize)]
pub struct LoginLogResponse {
    /// ログID
    pub login_log_id: String,
    /// ユーザーID
    pub user_id: String,
    /// ユーザー名
    pub username: String,
    /// メールアドレス
    pub email: String,
    /// 接続元IP
    pub ip_address: String,
    /// User-Agent
    pub user_agent: String,
    /// 記録日時
    pub created_at: String,
}

impl From<LoginLogEntry> for LoginLogResponse {
    fn from(entry: LoginLogEntry) -> Self {
        Self {
            login_log_id: entry.id.to_string(),
            user_id: entry.user_id.to_string(),
            username: entry.username,
            email: entry.email,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            created_at: format_time(&entry.created_at),
        }
    }
}

/// ログインログ一覧
#[derive(Debug, Serialize)]
pub struct LoginLogListResponse {
    /// 総件数
    pub total: i64,
    /// 現在ページの要素
    pub login_log_list: Vec<LoginLogResponse>,
}

/// 操作ログ
#[derive(Debug, Serialize)]
pub struct OperationLogResponse {
    /// ログID
    pub operation_log_id: String,
    /// 操作したユーザーID
    pub user_id: String,
    /// ユーザー名
    pub username: String,
    /// メールアドレス
    pub email: String,
    /// 接続元IP
    pub ip_address: String,
    /// User-Agent
    pub user_agent: String,
    /// 操作種別
    pub operation: String,
    /// 対象ID
    pub entity_id: String,
    /// 対象種別
    pub entity_type: String,
    /// 説明
    pub description: String,
    /// 結果
    pub status: String,
    /// 記録日時
    pub created_at: String,
}

impl From<OperationLogEntry> for OperationLogResponse {
    fn from(entry: OperationLogEntry) -> Self {
        Self {
            operation_log_id: entry.id.to_string(),
            user_id: entry.user_id.to_string(),
            username: entry.username,
            email: entry.email,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            operation: entry.operation.to_string(),
            entity_id: entry.entity_id.to_string(),
            entity_type: entry.entity_type.to_string(),
            description: entry.description,
            status: entry.status.to_string(),
            created_at: format_time(&entry.created_at),
        }
    }
}

/// 操作ログ一覧
#[derive(Debug, Serialize)]
pub struct OperationLogListResponse {
    /// 総件数
    pub total: i64,
    /// 現在ページの要素
    pub operation_log_list: Vec<OperationLogResponse>,
}

/// GET /api/v1/admin/login-log/list
pub async fn get_login_log_list(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<LoginLogListQuery>,
) -> ApiResult<LoginLogListResponse> {
    let pagination = validation::pagination(query.page, query.page_size, query.desc)?;
    let filter = LoginLogFilter {
        created: validation::time_range(query.create_start_time, query.create_end_time)?,
        query: validation::search_query(query.query)?,
    };

    let list = service::logs::get_login_log_list(&state, &filter, &pagination).await?;
    Ok(ApiResponse::ok(LoginLogListResponse {
        total: list.total,
        login_log_list: list.items.into_iter().map(LoginLogResponse::from).collect(),
    }))
}

/// GET /api/v1/admin/operation-log/list
pub async fn get_operation_log_list(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<OperationLogListQuery>,
) -> ApiResult<OperationLogListResponse> {
    let pagination = validation::pagination(query.page, query.page_size, query.desc)?;
    let filter = OperationLogFilter {
        operation: query.operation,
        entity_type: query.entity_type,
        status: query.status,
        created: validation::time_range(query.create_start_time, query.create_end_time)?,
        query: validation::search_query(query.query)?,
    };

    let list = service::logs::get_operation_log_list(&state, &filter, &pagination).await?;
    Ok(ApiResponse::ok(OperationLogListResponse {
        total: list.total,
        operation_log_list: list
            .items
            .into_iter()
            .map(OperationLogResponse::from)
            .collect(),
    }))
}
