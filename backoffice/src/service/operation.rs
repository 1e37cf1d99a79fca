use crate::audit::OperationLogEvent;
use crate::common::error::AdminResult;
use crate::common::ip::ClientInfo;
use crate::types::{EntityType, Operation, OperationStatus};
use crate::AppState;
use chrono::Utc;
use uuid::Uuid;

/// 管理操作の実行者
#[derive(Debug, Clone)]
pub struct Operator {
    /// 実行者のユーザーID
    pub user_id: Uuid,
    /// 接続元
    pub client: ClientInfo,
}

impl Operator {
    /// 作成
    pub fn new(user_id: Uuid, client: ClientInfo) -> Self {
        Self { user_id, client }
    }
}

/// 操作結果に応じてSUCCESS/FAILUREの操作ログを積み、結果をそのまま返す
///
/// `entity_id`は成功時の結果から取れない場合もあるため呼び出し側が決める。
pub(crate) async fn record<T>(
    state: &AppState,
    operator: &Operator,
    operation: Operation,
    entity_type: EntityType,
    entity_id: Uuid,
    description: String,
    result: AdminResult<T>,
) -> AdminResult<T> {
    let (status, description) = match &result {
        Ok(_) => (OperationStatus::Success, description),
        Err(e) => (
            OperationStatus::Failure,
            format!("Failed to {}: {}", lowercase_first(&description), e.external_message()),
        ),
    };
    let event = OperationLogEvent {
        user_id: operator.user_id.to_string(),
        ip_address: operator.client.ip_address.clone(),
        user_agent: operator.client.user_agent.clone(),
        operation,
        entity_id: entity_id.to_string(),
        entity_type,
        description,
        status,
        timestamp: Utc::now(),
    };
    state.log_buffer.enqueue_operation(&event).await;
    result
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
