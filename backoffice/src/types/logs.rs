use super::TimeRange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 操作種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// 作成
    Create,
    /// 更新
    Update,
    /// 削除
    Delete,
}

string_enum!(Operation {
    Create => "CREATE",
    Update => "UPDATE",
    Delete => "DELETE",
});

/// 操作対象のエンティティ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    /// ユーザー
    User,
    /// ドキュメント
    Documentation,
    /// お知らせ
    Notice,
}

string_enum!(EntityType {
    User => "USER",
    Documentation => "DOCUMENTATION",
    Notice => "NOTICE",
});

/// 操作結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    /// 成功
    Success,
    /// 失敗
    Failure,
}

string_enum!(OperationStatus {
    Success => "SUCCESS",
    Failure => "FAILURE",
});

/// ログインログ
///
/// ユーザー名とメールアドレスは書き込み時点の値を複製して持つ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginLogEntry {
    /// ログID
    pub id: Uuid,
    /// ユーザーID
    pub user_id: Uuid,
    /// ユーザー名（書き込み時点）
    pub username: String,
    /// メールアドレス（書き込み時点）
    pub email: String,
    /// クライアントIPアドレス
    pub ip_address: String,
    /// User-Agent
    pub user_agent: String,
    /// 記録日時
    pub created_at: DateTime<Utc>,
}

/// 操作ログ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationLogEntry {
    /// ログID
    pub id: Uuid,
    /// 操作したユーザーID
    pub user_id: Uuid,
    /// ユーザー名（書き込み時点）
    pub username: String,
    /// メールアドレス（書き込み時点）
    pub email: String,
    /// クライアントIPアドレス
    pub ip_address: String,
    /// User-Agent
    pub user_agent: String,
    /// 操作種別
    pub operation: Operation,
    /// 操作対象ID
    pub entity_id: Uuid,
    /// 操作対象の種別
    pub entity_type: EntityType,
    /// 説明
    pub description: String,
    /// 結果
    pub status: OperationStatus,
    /// 記録日時
    pub created_at: DateTime<Utc>,
}

/// ログインログの書き込み内容
///
/// ユーザー名・メールアドレスは書き込み時にユーザーレコードから補われる。
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoginLog {
    /// ユーザーID
    pub user_id: Uuid,
    /// クライアントIPアドレス
    pub ip_address: String,
    /// User-Agent
    pub user_agent: String,
    /// 発生日時
    pub created_at: DateTime<Utc>,
}

/// 操作ログの書き込み内容
#[derive(Debug, Clone, PartialEq)]
pub struct NewOperationLog {
    /// 操作したユーザーID
    pub user_id: Uuid,
    /// クライアントIPアドレス
    pub ip_address: String,
    /// User-Agent
    pub user_agent: String,
    /// 操作種別
    pub operation: Operation,
    /// 操作対象ID
    pub entity_id: Uuid,
    /// 操作対象の種別
    pub entity_type: EntityType,
    /// 説明
    pub description: String,
    /// 結果
    pub status: OperationStatus,
    /// 発生日時
    pub created_at: DateTime<Utc>,
}

/// ログインログ一覧のフィルタ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginLogFilter {
    /// 記録日時の範囲
    pub created: TimeRange,
    /// ユーザー名・メール・IP・User-Agentへの部分一致
    pub query: Option<String>,
}

/// 操作ログ一覧のフィルタ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationLogFilter {
    /// 操作種別
    pub operation: Option<Operation>,
    /// 対象種別
    pub entity_type: Option<EntityType>,
    /// 結果
    pub status: Option<OperationStatus>,
    /// 記録日時の範囲
    pub created: TimeRange,
    /// ユーザー名・メール・IP・User-Agent・説明への部分一致
    pub query: Option<String>,
}
