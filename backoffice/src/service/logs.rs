use crate::common::error::AdminResult;
use crate::types::{
    CachedList, LoginLogEntry, LoginLogFilter, OperationLogEntry, OperationLogFilter, Pagination,
};
use crate::AppState;

/// 一覧の前にバッファを排出する（設定で無効化できる）
///
/// 排出に失敗しても一覧は永続化済みの分だけで返す。
async fn drain_before_read(state: &AppState) {
    if !state.config.tasks.drain_before_log_list {
        return;
    }
    if let Err(e) = state.log_buffer.drain_all().await {
        tracing::warn!(error = %e, "Failed to drain log buffer before list read");
    }
}

/// ログインログ一覧
pub async fn get_login_log_list(
    state: &AppState,
    filter: &LoginLogFilter,
    pagination: &Pagination,
) -> AdminResult<CachedList<LoginLogEntry>> {
    drain_before_read(state).await;
    state.login_logs.get_list(filter, pagination).await
}

/// 操作ログ一覧
pub async fn get_operation_log_list(
    state: &AppState,
    filter: &OperationLogFilter,
    pagination: &Pagination,
) -> AdminResult<CachedList<OperationLogEntry>> {
    drain_before_read(state).await;
    state.operation_logs.get_list(filter, pagination).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::LoginLogEvent;
    use crate::config::AppConfig;
    use crate::db::test_utils::{test_cache, test_db_pool};
    use crate::test_support::test_state;
    use crate::types::{User, UserRole};

    async fn seed(state: &AppState) -> User {
        let user = User::new("alice", "alice@example.com", "hash", UserRole::User, "acme");
        state.users.insert(&user).await.unwrap();
        state
            .log_buffer
            .enqueue_login(&LoginLogEvent::new(user.id, "10.0.0.1", "agent"))
            .await;
        user
    }

    #[tokio::test]
    async fn list_reflects_buffered_events() {
        let state = test_state().await;
        seed(&state).await;
        let list = get_login_log_list(&state, &LoginLogFilter::default(), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.items[0].username, "alice");
    }

    #[tokio::test]
    async fn drain_can_be_left_to_the_scheduler() {
        let mut config = AppConfig::default();
        config.tasks.drain_before_log_list = false;
        let state = AppState::new(config, test_db_pool().await, test_cache()).unwrap();
        seed(&state).await;

        let list = get_login_log_list(&state, &LoginLogFilter::default(), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(list.total, 0);

        state.log_buffer.drain_all().await.unwrap();
        let list = get_login_log_list(&state, &LoginLogFilter::default(), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(list.total, 1);
    }
}
