//! キューに積むログイベント
//!
//! キューの中身はJSON文字列で、排出時にフィールドを検証して書き込み内容に変換する。

use crate::common::error::AdminError;
use crate::types::{EntityType, NewLoginLog, NewOperationLog, Operation, OperationStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ログインイベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginLogEvent {
    /// ユーザーID
    pub user_id: String,
    /// クライアントIPアドレス
    pub ip_address: String,
    /// User-Agent
    pub user_agent: String,
    /// 発生日時
    pub timestamp: DateTime<Utc>,
}

impl LoginLogEvent {
    /// 現在時刻のイベントを作る
    pub fn new(user_id: Uuid, ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            user_id: user_id.to_string(),
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
            timestamp: Utc::now(),
        }
    }
}

impl TryFrom<LoginLogEvent> for NewLoginLog {
    type Error = AdminError;

    fn try_from(event: LoginLogEvent) -> Result<Self, Self::Error> {
        Ok(NewLoginLog {
            user_id: parse_event_id("user_id", &event.user_id)?,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            created_at: event.timestamp,
        })
    }
}

/// 管理操作イベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationLogEvent {
    /// 操作したユーザーID
    pub user_id: String,
    /// クライアントIPアドレス
    pub ip_address: String,
    /// User-Agent
    pub user_agent: String,
    /// 操作種別
    pub operation: Operation,
    /// 操作対象ID
    pub entity_id: String,
    /// 操作対象の種別
    pub entity_type: EntityType,
    /// 説明
    pub description: String,
    /// 結果
    pub status: OperationStatus,
    /// 発生日時
    pub timestamp: DateTime<Utc>,
}

impl TryFrom<OperationLogEvent> for NewOperationLog {
    type Error = AdminError;

    fn try_from(event: OperationLogEvent) -> Result<Self, Self::Error> {
        Ok(NewOperationLog {
            user_id: parse_event_id("user_id", &event.user_id)?,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            operation: event.operation,
            entity_id: parse_event_id("entity_id", &event.entity_id)?,
            entity_type: event.entity_type,
            description: event.description,
            status: event.status,
            created_at: event.timestamp,
        })
    }
}

fn parse_event_id(field: &str, value: &str) -> Result<Uuid, AdminError> {
    Uuid::parse_str(value)
        .map_err(|e| AdminError::InvalidRequest(format!("invalid {} '{}': {}", field, value, e)))
}
